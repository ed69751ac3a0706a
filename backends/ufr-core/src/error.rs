// this_file: backends/ufr-core/src/error.rs

//! Error types for ufr.
//!
//! Every variant carries owned strings so a failure can be cloned and handed
//! to all callers waiting on the same coalesced request.

use thiserror::Error;

/// Main error type for ufr operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UfrError {
    /// Unicode range string could not be parsed
    #[error("Malformed unicode range '{input}': {reason}")]
    MalformedRange { input: String, reason: String },

    /// Fetched document carried an unexpected schema version
    #[error("Incorrect schema version for {path}; need {expected}, got {found}")]
    SchemaVersionMismatch {
        path: String,
        expected: u32,
        found: String,
    },

    /// Transport or storage failure while fetching a document
    #[error("Failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },

    /// Document was fetched but its body has the wrong shape
    #[error("Invalid document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    /// Font metadata lists no usable category/style/weight
    #[error("Font '{font_id}' declares no usable typeform")]
    NoVariant { font_id: String },

    /// Code point set layout cannot address the code point space
    #[error("Invalid code point set layout: {reason}")]
    InvalidLayout { reason: String },

    /// Resolver configuration rejected
    #[error("Invalid resolver configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl UfrError {
    /// Build a malformed range error
    pub fn malformed_range(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRange {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Build a fetch error from any displayable cause
    pub fn fetch(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an invalid document error from any displayable cause
    pub fn invalid_document(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure came from loading a document, and so may be
    /// retried against the default data root.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::SchemaVersionMismatch { .. } | Self::InvalidDocument { .. }
        )
    }
}
