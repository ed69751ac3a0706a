// this_file: crates/ufr-resolver/src/resolver.rs

//! The font resolver and its output.

use crate::config::{ResolveOptions, ResolverConfig};
use crate::loader::{CallLoader, EvictRoot, Loaded};
use crate::selection::{select_subset, select_variant, SelectorCache};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::ops::Range;
use std::sync::Arc;
use ufr_core::utils::{bucket_path, font_file_path, font_meta_path, join_root, normalize_root};
use ufr_core::{
    BucketData, BucketRange, CacheStats, CodePointSet, DataSource, DocumentCache, FontData,
    LanguageDetector, ResolveDiagnostics, Result,
};
use ufr_unicode::{is_whitespace, normalize_language_tag, ScriptLanguageDetector};

/// Font assignment for one string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Distinct font file references relative to `data_root`, in order of
    /// first use
    pub font_references: Vec<String>,

    /// Index into `font_references` for every UTF-16 code unit of the text
    pub char_font_index: Vec<u32>,

    /// Root the references resolve against
    pub data_root: String,
}

/// Contiguous code units sharing one font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRun {
    pub units: Range<usize>,
    pub font_index: u32,
}

impl Resolution {
    /// Absolute locations of the font files.
    pub fn font_urls(&self) -> Vec<String> {
        self.font_references
            .iter()
            .map(|reference| join_root(&self.data_root, reference))
            .collect()
    }

    /// Reference of the font assigned to code unit `unit`.
    pub fn font_for_unit(&self, unit: usize) -> Option<&str> {
        let index = *self.char_font_index.get(unit)?;
        self.font_references
            .get(index as usize)
            .map(String::as_str)
    }

    /// Split the text into runs of code units that use the same font.
    pub fn runs(&self) -> Vec<FontRun> {
        let mut runs: Vec<FontRun> = Vec::new();
        for (unit, &font_index) in self.char_font_index.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.font_index == font_index => run.units.end = unit + 1,
                _ => runs.push(FontRun {
                    units: unit..unit + 1,
                    font_index,
                }),
            }
        }
        runs
    }
}

/// Coverage sets compiled from font metadata, keyed by the metadata's
/// cache key.
#[derive(Default)]
struct CoverageTable {
    sets: DashMap<String, Arc<CodePointSet>>,
}

impl EvictRoot for CoverageTable {
    fn evict_root(&self, prefix: &str) -> usize {
        let before = self.sets.len();
        self.sets.retain(|key, _| !key.starts_with(prefix));
        before - self.sets.len()
    }
}

/// One code point of the input and the code units it occupies
struct Slot {
    unit: usize,
    width: usize,
    code_point: u32,
}

fn text_slots(text: &str) -> Vec<Slot> {
    let mut unit = 0;
    text.chars()
        .map(|ch| {
            let slot = Slot {
                unit,
                width: ch.len_utf16(),
                code_point: u32::from(ch),
            };
            unit += slot.width;
            slot
        })
        .collect()
}

/// Unique items in first-seen order
fn distinct<T: Copy + Eq + Hash>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}

/// Ordered, deduplicated font file references
#[derive(Default)]
struct References {
    ordered: Vec<String>,
    positions: HashMap<String, u32>,
}

impl References {
    fn intern(&mut self, reference: String) -> u32 {
        if let Some(&index) = self.positions.get(&reference) {
            return index;
        }
        let index = self.ordered.len() as u32;
        self.positions.insert(reference.clone(), index);
        self.ordered.push(reference);
        index
    }
}

/// Resolves fonts for text against a coverage index.
///
/// Bucket documents, font metadata and compiled coverage sets are cached in
/// the resolver and shared by every call, including concurrent ones.
pub struct FontResolver {
    source: Arc<dyn DataSource>,
    detector: Arc<dyn LanguageDetector>,
    config: ResolverConfig,
    buckets: DocumentCache<BucketData>,
    fonts: DocumentCache<FontData>,
    coverage: CoverageTable,
    selectors: SelectorCache,
}

impl FontResolver {
    /// Resolver with the default configuration.
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self::build(source, ResolverConfig::default())
    }

    pub fn with_config(source: Arc<dyn DataSource>, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(source, config))
    }

    fn build(source: Arc<dyn DataSource>, mut config: ResolverConfig) -> Self {
        config.default_root = normalize_root(&config.default_root).to_string();
        let selectors = SelectorCache::new(config.selector_cache_size);
        Self {
            source,
            detector: Arc::new(ScriptLanguageDetector::new()),
            config,
            buckets: DocumentCache::new(),
            fonts: DocumentCache::new(),
            coverage: CoverageTable::default(),
            selectors,
        }
    }

    /// Replace the detector used when a call names no language.
    pub fn with_language_detector(mut self, detector: impl LanguageDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Resolve the font of every code unit of `text`.
    pub fn resolve(&self, text: &str, options: &ResolveOptions) -> Result<Resolution> {
        let loader = CallLoader::new(
            self.source.as_ref(),
            self.config.schema_version,
            &self.config.default_root,
            options.data_root.as_deref(),
        );
        let lang = match options.lang.as_deref() {
            Some(tag) => normalize_language_tag(tag),
            None => normalize_language_tag(&self.detector.detect(text)),
        };

        let slots = text_slots(text);
        let text_units = slots.last().map_or(0, |slot| slot.unit + slot.width);
        let mut diagnostics = ResolveDiagnostics::new(text_units);
        diagnostics.code_points = slots.len();

        // Bucket documents of every code point
        let bucket_starts = distinct(
            slots
                .iter()
                .map(|slot| BucketRange::for_code_point(slot.code_point).start),
        );
        let buckets: HashMap<u32, Arc<BucketData>> = bucket_starts
            .par_iter()
            .map(|&start| {
                loader
                    .load(&self.buckets, &[&self.fonts, &self.coverage], &bucket_path(start))
                    .map(|loaded| (start, loaded.document))
            })
            .collect::<Result<_>>()?;
        diagnostics.buckets = buckets.len();

        // Subset per code point, then metadata of every subset in use
        let mut matcher = self.selectors.matcher(&lang);
        let mut subset_ids: Vec<&str> = Vec::with_capacity(slots.len());
        for slot in &slots {
            let bucket = &buckets[&BucketRange::for_code_point(slot.code_point).start];
            let id = match select_subset(bucket, slot.code_point, &mut matcher) {
                Some(id) => id,
                None => {
                    diagnostics.record_uncovered(slot.code_point);
                    self.config.fallback_subset.as_str()
                }
            };
            subset_ids.push(id);
        }

        let fonts: HashMap<&str, Loaded<FontData>> = distinct(subset_ids.iter().copied())
            .par_iter()
            .map(|&id| {
                loader
                    .load(&self.fonts, &[&self.buckets, &self.coverage], &font_meta_path(id))
                    .map(|loaded| (id, loaded))
            })
            .collect::<Result<_>>()?;
        diagnostics.fonts = fonts.len();

        // Carry the current font forward, switching only where it falls short
        let mut references = References::default();
        let mut variant_index: HashMap<&str, u32> = HashMap::new();
        let mut current: Option<(Arc<CodePointSet>, u32)> = None;
        let mut char_font_index = vec![0u32; text_units];

        for (slot, subset_id) in slots.iter().zip(&subset_ids) {
            let carried = match &current {
                Some((coverage, index))
                    if is_whitespace(slot.code_point) || coverage.has(slot.code_point) =>
                {
                    Some(*index)
                }
                _ => None,
            };

            let index = match carried {
                Some(index) => {
                    diagnostics.carried_forward += 1;
                    index
                }
                None => {
                    let loaded = &fonts[subset_id];
                    let font = loaded.document.as_ref();
                    let coverage = self.coverage_for(&loader, &loaded.key, font)?;
                    let index = match variant_index.get(font.id.as_str()) {
                        Some(&index) => index,
                        None => {
                            let variant =
                                select_variant(font, options.category, options.style, options.weight)?;
                            let index = references.intern(font_file_path(
                                &font.id,
                                variant.category,
                                variant.style,
                                variant.weight,
                                &self.config.font_file_extension,
                            ));
                            variant_index.insert(font.id.as_str(), index);
                            index
                        }
                    };
                    current = Some((coverage, index));
                    index
                }
            };

            char_font_index[slot.unit..slot.unit + slot.width].fill(index);
        }

        diagnostics.font_references = references.ordered.len();
        diagnostics.fell_back_to_default_root = loader.fell_back();
        diagnostics.log(&self.config.fallback_subset);

        Ok(Resolution {
            font_references: references.ordered,
            char_font_index,
            data_root: loader.root(),
        })
    }

    /// Resolve several strings in parallel. Results keep the input order.
    pub fn resolve_batch<S>(&self, texts: &[S], options: &ResolveOptions) -> Vec<Result<Resolution>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.resolve(text.as_ref(), options))
            .collect()
    }

    /// Coverage set of a subset, compiled at most once per metadata document.
    ///
    /// Metadata loaded from a root the call has since abandoned is compiled
    /// for this call only.
    fn coverage_for(
        &self,
        loader: &CallLoader<'_>,
        key: &str,
        font: &FontData,
    ) -> Result<Arc<CodePointSet>> {
        if let Some(set) = self.coverage.sets.get(key) {
            return Ok(set.clone());
        }
        if !key.starts_with(&join_root(&loader.root(), "")) {
            return self.compile_coverage(font);
        }
        match self.coverage.sets.entry(key.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let set = self.compile_coverage(font)?;
                entry.insert(set.clone());
                Ok(set)
            }
        }
    }

    fn compile_coverage(&self, font: &FontData) -> Result<Arc<CodePointSet>> {
        let set =
            CodePointSet::from_range_string_with_layout(&font.ranges, self.config.layout.clone())?;
        debug!(
            target: "ufr::resolve",
            "Compiled coverage of {}: {} code points in {} nodes",
            font.id,
            set.len(),
            set.node_count()
        );
        Ok(Arc::new(set))
    }

    /// Forget every cached document and coverage set.
    pub fn clear_cache(&self) {
        self.buckets.clear();
        self.fonts.clear();
        self.coverage.sets.clear();
        debug!(target: "ufr::resolve", "Cleared resolver caches");
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            bucket_count: self.buckets.len(),
            font_meta_count: self.fonts.len(),
            coverage_set_count: self.coverage.sets.len(),
            in_flight_count: self.buckets.pending() + self.fonts.pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ufr_core::{coverage, ranges, MemorySource, TrieLayout};

    const ROOT: &str = "mem://data";

    fn resolver() -> (Arc<MemorySource>, FontResolver) {
        let source = Arc::new(MemorySource::new());
        let latin = coverage::encode(
            &ranges::parse("20,41-5A").unwrap(),
            BucketRange::for_code_point(0),
        );
        source.insert(
            ROOT,
            "index/plane0/0-7f.json",
            format!(r#"[1,{{".*":{{"latin":"{latin}"}}}}]"#),
        );
        source.insert(
            ROOT,
            "font-meta/latin.json",
            r#"[1,{"id":"latin","ranges":"20,41-5A","typeforms":{"sans-serif":{"normal":[400,700]}}}]"#,
        );
        let config = ResolverConfig::default().with_default_root(format!("{ROOT}/"));
        let resolver = FontResolver::with_config(source.clone(), config).unwrap();
        (source, resolver)
    }

    #[test]
    fn test_text_slots_count_utf16_units() {
        let slots = text_slots("a😀b");
        let units: Vec<(usize, usize)> = slots.iter().map(|s| (s.unit, s.width)).collect();
        assert_eq!(units, vec![(0, 1), (1, 2), (3, 1)]);
    }

    #[test]
    fn test_runs_and_urls() {
        let resolution = Resolution {
            font_references: vec!["font-files/a/x.woff".into(), "font-files/b/y.woff".into()],
            char_font_index: vec![0, 0, 1, 1, 0],
            data_root: "https://cdn.test".into(),
        };
        assert_eq!(
            resolution.runs(),
            vec![
                FontRun { units: 0..2, font_index: 0 },
                FontRun { units: 2..4, font_index: 1 },
                FontRun { units: 4..5, font_index: 0 },
            ]
        );
        assert_eq!(
            resolution.font_urls()[1],
            "https://cdn.test/font-files/b/y.woff"
        );
        assert_eq!(resolution.font_for_unit(3), Some("font-files/b/y.woff"));
        assert_eq!(resolution.font_for_unit(5), None);
    }

    #[test]
    fn test_resolve_single_subset() {
        let (source, resolver) = resolver();
        let resolution = resolver.resolve("AB C", &ResolveOptions::default()).unwrap();
        assert_eq!(
            resolution.font_references,
            vec!["font-files/latin/sans-serif.normal.400.woff"]
        );
        assert_eq!(resolution.char_font_index, vec![0, 0, 0, 0]);
        assert_eq!(resolution.data_root, ROOT);
        assert_eq!(source.fetch_count(), 2);

        let stats = resolver.cache_stats();
        assert_eq!(stats.bucket_count, 1);
        assert_eq!(stats.font_meta_count, 1);
        assert_eq!(stats.coverage_set_count, 1);
        assert_eq!(stats.in_flight_count, 0);
    }

    #[test]
    fn test_configured_trie_layout_is_used() {
        let source = Arc::new(MemorySource::new());
        let latin = coverage::encode(
            &ranges::parse("20,41-5A").unwrap(),
            BucketRange::for_code_point(0),
        );
        source.insert(
            ROOT,
            "index/plane0/0-7f.json",
            format!(r#"[1,{{".*":{{"latin":"{latin}"}}}}]"#),
        );
        source.insert(
            ROOT,
            "font-meta/latin.json",
            r#"[1,{"id":"latin","ranges":"20,41-5A","typeforms":{"sans-serif":{"normal":[400]}}}]"#,
        );
        let layout = TrieLayout::new(vec![5, 4, 4]).unwrap();
        let config = ResolverConfig::default()
            .with_default_root(ROOT)
            .with_layout(layout.clone());
        let resolver = FontResolver::with_config(source, config).unwrap();

        let resolution = resolver.resolve("A B", &ResolveOptions::default()).unwrap();
        assert_eq!(resolution.char_font_index, vec![0, 0, 0]);

        let key = join_root(ROOT, &font_meta_path("latin"));
        let set = resolver.coverage.sets.get(&key).unwrap().clone();
        assert_eq!(set.layout(), &layout);
        assert!(set.has(0x41) && !set.has(0x61));
    }

    #[test]
    fn test_empty_text_fetches_nothing() {
        let (source, resolver) = resolver();
        let resolution = resolver.resolve("", &ResolveOptions::default()).unwrap();
        assert!(resolution.font_references.is_empty());
        assert!(resolution.char_font_index.is_empty());
        assert_eq!(source.fetch_count(), 0);
    }

    #[test]
    fn test_clear_cache_refetches() {
        let (source, resolver) = resolver();
        let options = ResolveOptions::default().with_weight(650);
        let first = resolver.resolve("A", &options).unwrap();
        assert_eq!(
            first.font_references,
            vec!["font-files/latin/sans-serif.normal.700.woff"]
        );

        resolver.clear_cache();
        assert_eq!(resolver.cache_stats(), CacheStats::default());
        source.reset_counters();
        assert_eq!(resolver.resolve("A", &options).unwrap(), first);
        assert_eq!(source.fetch_count(), 2);
    }
}
