// this_file: backends/ufr-core/src/lib.rs

//! Core traits, codecs and types for the ufr font resolver.

pub mod cache;
pub mod codepoint_set;
pub mod coverage;
pub mod diagnostics;
pub mod error;
pub mod ranges;
pub mod source;
pub mod traits;
pub mod types;
pub mod utils;

pub use cache::{CacheStats, DocumentCache};
pub use codepoint_set::{CodePointSet, TrieLayout};
pub use coverage::{BucketRange, EncodedCoverage};
pub use diagnostics::ResolveDiagnostics;
pub use error::UfrError;
pub use ranges::CodeRange;
pub use source::MemorySource;
pub use traits::{DataSource, LanguageDetector};
pub use types::{BucketData, FontCategory, FontData, FontStyle, Ordered, Typeforms};

/// Result type for ufr operations
pub type Result<T> = std::result::Result<T, UfrError>;

/// Highest Unicode scalar value addressable by the index.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;
