// this_file: crates/ufr-resolver/src/lib.rs

//! Resolve which font file renders each character of a string.
//!
//! Resolution runs in three stages separated by barriers:
//!
//! 1. every code point is mapped to its 128-code-point bucket and the bucket
//!    documents are fetched;
//! 2. each code point is matched against its bucket's language selectors to
//!    pick a font subset, and the subsets' metadata is fetched;
//! 3. the text is walked once more, carrying the current font across
//!    whitespace and covered characters, and each run is given a concrete
//!    font file reference.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ufr_core::MemorySource;
//! use ufr_resolver::{FontResolver, ResolveOptions};
//!
//! let resolver = FontResolver::new(Arc::new(MemorySource::new()));
//! let resolution = resolver.resolve("Hello 世界", &ResolveOptions::default())?;
//! for run in resolution.runs() {
//!     let reference = &resolution.font_references[run.font_index as usize];
//!     println!("{:?} -> {reference}", run.units);
//! }
//! # Ok::<(), ufr_core::UfrError>(())
//! ```

pub mod config;
mod loader;
pub mod resolver;
pub mod selection;

pub use config::{ResolveOptions, ResolverConfig, DEFAULT_DATA_URL};
pub use resolver::{FontResolver, FontRun, Resolution};
