// this_file: backends/ufr-core/src/traits.rs

//! Collaborator traits the resolver is generic over.

use crate::Result;

/// Fetch-by-path capability over a data root.
///
/// `root` is the data location in whatever form the implementation
/// understands (a directory, a base URL, a bundle name); `path` is relative
/// to it, e.g. `index/plane0/0-7f.json`. Implementations return the UTF-8
/// body or a [`crate::UfrError::Fetch`].
pub trait DataSource: Send + Sync {
    fn fetch(&self, root: &str, path: &str) -> Result<String>;

    /// Source name for diagnostics
    fn name(&self) -> &str;
}

/// Guess a BCP-47 language tag for a piece of text.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> String;
}

impl<F> LanguageDetector for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn detect(&self, text: &str) -> String {
        self(text)
    }
}
