// this_file: crates/ufr-resolver/tests/common/mod.rs

//! A small coverage index published into a `MemorySource`.

#![allow(dead_code)]

use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::{Arc, Once};
use ufr_core::coverage::{encode, BucketRange};
use ufr_core::ranges::parse;
use ufr_core::utils::{bucket_path, font_meta_path};
use ufr_core::{BucketData, FontData, MemorySource, Ordered};
use ufr_resolver::{FontResolver, ResolverConfig};

pub const DEFAULT_ROOT: &str = "mem://cdn/data";

/// Font subsets: id, covered ranges, typeforms
pub const SUBSETS: &[(&str, &str, &str)] = &[
    (
        "latin",
        "20-7E,A0-FF",
        r#"{"sans-serif":{"normal":[400,700],"italic":[400]},"serif":{"normal":[400]}}"#,
    ),
    (
        "cjk-jp",
        "20-7E,3000-30FF,4E00-9FFF",
        r#"{"sans-serif":{"normal":[400]}}"#,
    ),
    (
        "cjk-sc",
        "20-7E,4E00-9FFF",
        r#"{"sans-serif":{"normal":[300,500]}}"#,
    ),
    ("emoji", "1F600-1F64F", r#"{"sans-serif":{"normal":[400]}}"#),
];

/// Language selectors and the subsets they list, in preference order
pub const SELECTORS: &[(&str, &[&str])] = &[
    ("^ja", &["cjk-jp"]),
    (".*", &["latin", "cjk-sc", "emoji"]),
];

/// Buckets published with no coverage at all (private use area)
pub const EMPTY_BUCKETS: &[u32] = &[0xE000];

fn subset_ranges(id: &str) -> &'static str {
    SUBSETS
        .iter()
        .find(|(subset, _, _)| *subset == id)
        .map(|(_, ranges, _)| *ranges)
        .unwrap()
}

/// Publish every bucket and metadata document of the fixture under `root`.
pub fn publish(source: &MemorySource, root: &str) {
    let mut starts: BTreeSet<u32> = EMPTY_BUCKETS.iter().copied().collect();

    for (id, ranges, typeforms) in SUBSETS {
        let font: FontData = serde_json::from_str(&format!(
            r#"{{"id":"{id}","ranges":"{ranges}","typeforms":{typeforms}}}"#
        ))
        .unwrap();
        source
            .insert_document(root, &font_meta_path(id), 1, &font)
            .unwrap();

        for range in parse(ranges).unwrap() {
            let mut start = range.start & !0x7F;
            while start <= range.end {
                starts.insert(start);
                start += 128;
            }
        }
    }

    for start in starts {
        let bucket = BucketRange::for_code_point(start);
        let selectors = SELECTORS
            .iter()
            .map(|(selector, ids)| {
                let fonts: Ordered<String, String> = ids
                    .iter()
                    .filter_map(|id| {
                        let coverage = encode(&parse(subset_ranges(id)).unwrap(), bucket);
                        (!coverage.is_empty()).then(|| (id.to_string(), coverage))
                    })
                    .collect();
                (selector.to_string(), fonts)
            })
            .collect();
        source
            .insert_document(root, &bucket_path(start), 1, &BucketData { selectors })
            .unwrap();
    }
}

/// Source holding the fixture under [`DEFAULT_ROOT`] and a resolver on it.
pub fn fixture() -> (Arc<MemorySource>, FontResolver) {
    fixture_with(MemorySource::new(), ResolverConfig::default())
}

pub fn fixture_with(source: MemorySource, config: ResolverConfig) -> (Arc<MemorySource>, FontResolver) {
    publish(&source, DEFAULT_ROOT);
    let source = Arc::new(source);
    let resolver =
        FontResolver::with_config(source.clone(), config.with_default_root(DEFAULT_ROOT)).unwrap();
    (source, resolver)
}

/// Log records captured by the test logger
pub struct Captured {
    pub level: Level,
    pub target: String,
    pub message: String,
}

struct CaptureLogger;

static RECORDS: Mutex<Vec<Captured>> = parking_lot::const_mutex(Vec::new());
static INIT: Once = Once::new();
static LOGGER: CaptureLogger = CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.lock().push(Captured {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

/// Install the capturing logger (once per test binary).
pub fn capture_logs() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Number of captured records at `level` whose message mentions `needle`.
pub fn count_logs(level: Level, needle: &str) -> usize {
    RECORDS
        .lock()
        .iter()
        .filter(|record| record.level == level && record.message.contains(needle))
        .count()
}
