// this_file: crates/ufr-resolver/src/selection.rs

//! Picking a font subset for a code point and a file variant for a subset.

use log::warn;
use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use ufr_core::{BucketData, FontCategory, FontData, FontStyle, Ordered, Result, UfrError};

/// Compiled language selectors, shared by every call of a resolver.
///
/// Patterns that fail to compile are remembered as `None` so they are
/// reported once and never match.
pub struct SelectorCache {
    compiled: Mutex<LruCache<String, Option<Arc<Regex>>>>,
}

impl SelectorCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            compiled: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn compile(&self, pattern: &str) -> Option<Arc<Regex>> {
        let mut compiled = self.compiled.lock();
        if let Some(hit) = compiled.get(pattern) {
            return hit.clone();
        }
        let regex = match Regex::new(pattern) {
            Ok(regex) => Some(Arc::new(regex)),
            Err(e) => {
                warn!(target: "ufr::selection", "Ignoring invalid language selector {pattern:?}: {e}");
                None
            }
        };
        compiled.put(pattern.to_string(), regex.clone());
        regex
    }

    pub fn len(&self) -> usize {
        self.compiled.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matcher for one call's language tag.
    pub fn matcher<'a>(&'a self, lang: &'a str) -> LanguageMatcher<'a> {
        LanguageMatcher {
            cache: self,
            lang,
            results: HashMap::new(),
        }
    }
}

/// Selector matching for one language tag, memoized per selector.
pub struct LanguageMatcher<'a> {
    cache: &'a SelectorCache,
    lang: &'a str,
    results: HashMap<String, bool>,
}

impl LanguageMatcher<'_> {
    pub fn lang(&self) -> &str {
        self.lang
    }

    pub fn matches(&mut self, selector: &str) -> bool {
        if let Some(&hit) = self.results.get(selector) {
            return hit;
        }
        let matched = self
            .cache
            .compile(selector)
            .is_some_and(|regex| regex.is_match(self.lang));
        self.results.insert(selector.to_string(), matched);
        matched
    }
}

/// Subset of `bucket` that should render `code_point`.
///
/// The first selector matching the language is preferred; if none of its
/// fonts covers the code point, the remaining selectors are tried in
/// declaration order.
pub fn select_subset<'b>(
    bucket: &'b BucketData,
    code_point: u32,
    matcher: &mut LanguageMatcher<'_>,
) -> Option<&'b str> {
    let preferred = bucket
        .selectors
        .iter()
        .position(|(selector, _)| matcher.matches(selector));

    if let Some(index) = preferred {
        if let Some(id) = BucketData::covering_font(&bucket.selectors.0[index].1, code_point) {
            return Some(id);
        }
    }

    bucket
        .selectors
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != preferred)
        .find_map(|(_, (_, fonts))| BucketData::covering_font(fonts, code_point))
}

/// Entry for `preferred`, else `fallback`, else the first declared.
pub fn find_valid_key<K: PartialEq + Copy, V>(
    map: &Ordered<K, V>,
    preferred: K,
    fallback: K,
) -> Option<(K, &V)> {
    map.0
        .iter()
        .find(|(key, _)| *key == preferred)
        .or_else(|| map.0.iter().find(|(key, _)| *key == fallback))
        .or_else(|| map.0.first())
        .map(|(key, value)| (*key, value))
}

/// `target` if available, otherwise the closest candidate. Ties go to the
/// candidate listed first.
pub fn nearest_weight(candidates: &[u16], target: u16) -> Option<u16> {
    if candidates.contains(&target) {
        return Some(target);
    }
    let mut best: Option<u16> = None;
    for &candidate in candidates {
        if best.map_or(true, |b| candidate.abs_diff(target) < b.abs_diff(target)) {
            best = Some(candidate);
        }
    }
    best
}

/// Concrete file variant chosen for a subset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub category: FontCategory,
    pub style: FontStyle,
    pub weight: u16,
}

/// Narrow a subset's typeforms to the variant closest to the request.
pub fn select_variant(
    font: &FontData,
    category: FontCategory,
    style: FontStyle,
    weight: u16,
) -> Result<Variant> {
    let no_variant = || UfrError::NoVariant {
        font_id: font.id.clone(),
    };

    let (category, styles) =
        find_valid_key(&font.typeforms, category, FontCategory::SansSerif).ok_or_else(no_variant)?;
    let (style, weights) = find_valid_key(styles, style, FontStyle::Normal).ok_or_else(no_variant)?;
    let weight = nearest_weight(weights, weight).ok_or_else(no_variant)?;

    Ok(Variant {
        category,
        style,
        weight,
    })
}
