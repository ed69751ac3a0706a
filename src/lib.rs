// this_file: src/lib.rs

//! ufr: find the font file that renders each character of a string.
//!
//! The coverage index is split into 128-code-point buckets and fetched on
//! demand through a [`DataSource`]; only the buckets and font metadata a
//! string needs are ever loaded, and everything loaded is cached in the
//! [`FontResolver`].
//!
//! ```rust,no_run
//! use ufr::{default_resolver, ResolveOptions};
//!
//! let resolver = default_resolver();
//! let resolution = resolver.resolve("Hello, 世界", &ResolveOptions::default())?;
//! for url in resolution.font_urls() {
//!     println!("{url}");
//! }
//! # Ok::<(), ufr::UfrError>(())
//! ```

pub use ufr_core::{
    coverage, ranges, utils, BucketData, BucketRange, CacheStats, CodePointSet, CodeRange,
    DataSource, FontCategory, FontData, FontStyle, LanguageDetector, MemorySource, Ordered,
    Result, TrieLayout, UfrError,
};
pub use ufr_fs::FsSource;
#[cfg(feature = "http")]
pub use ufr_http::HttpSource;
pub use ufr_resolver::{
    FontResolver, FontRun, Resolution, ResolveOptions, ResolverConfig, DEFAULT_DATA_URL,
};
pub use ufr_unicode::{is_whitespace, normalize_language_tag, ScriptLanguageDetector};

/// Resolver reading the public index over HTTP with default settings.
#[cfg(feature = "http")]
pub fn default_resolver() -> FontResolver {
    FontResolver::new(std::sync::Arc::new(HttpSource::new()))
}
