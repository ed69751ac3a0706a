// this_file: crates/ufr-unicode/src/language.rs

//! Language tag guessing and normalization.

use icu_locid::LanguageIdentifier;
use icu_properties::{
    maps::{self, CodePointMapDataBorrowed},
    Script,
};
use ufr_core::LanguageDetector;

/// Tag used when nothing better is known
pub const DEFAULT_LANGUAGE: &str = "en";

/// Hiragana and Katakana blocks. Marks such as U+30FC have Script=Common
/// but only ever appear in Japanese text.
const KANA_BLOCKS: std::ops::RangeInclusive<char> = '\u{3040}'..='\u{30FF}';

/// Minimal detector that only tells Korean and Japanese apart from the
/// default, by looking for Hangul and kana.
///
/// Han ideographs alone are ambiguous between Chinese and Japanese and
/// resolve to the default; the index's selector fallback still finds a CJK
/// subset for them.
pub struct ScriptLanguageDetector {
    script_map: CodePointMapDataBorrowed<'static, Script>,
}

impl ScriptLanguageDetector {
    pub fn new() -> Self {
        Self {
            script_map: maps::script(),
        }
    }
}

impl Default for ScriptLanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for ScriptLanguageDetector {
    fn detect(&self, text: &str) -> String {
        let mut kana = false;
        for ch in text.chars() {
            let script = self.script_map.get(ch);
            if script == Script::Hangul {
                return "ko".to_string();
            }
            if KANA_BLOCKS.contains(&ch)
                || script == Script::Hiragana
                || script == Script::Katakana
            {
                kana = true;
            }
        }
        let tag = if kana { "ja" } else { DEFAULT_LANGUAGE };
        tag.to_string()
    }
}

/// Canonicalize a BCP-47 tag (`EN-us` → `en-US`). Tags ICU cannot parse
/// are passed through unchanged; an empty tag becomes [`DEFAULT_LANGUAGE`].
pub fn normalize_language_tag(tag: &str) -> String {
    let tag = tag.trim();
    if tag.is_empty() {
        return DEFAULT_LANGUAGE.to_string();
    }
    match tag.parse::<LanguageIdentifier>() {
        Ok(id) => id.to_string(),
        Err(e) => {
            log::debug!("Keeping unparseable language tag '{tag}': {e}");
            tag.to_string()
        }
    }
}
