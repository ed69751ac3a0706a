// this_file: crates/ufr-unicode/src/lib.rs

//! Unicode property helpers: `White_Space` membership, a script based
//! language guess and BCP-47 tag normalization.

pub mod language;
pub mod whitespace;

pub use language::{normalize_language_tag, ScriptLanguageDetector, DEFAULT_LANGUAGE};
pub use whitespace::is_whitespace;
