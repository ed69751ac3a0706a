// this_file: benches/resolve.rs

//! Resolution benchmarks over an in-memory index

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use ufr::utils::{bucket_path, font_meta_path};
use ufr::{
    coverage, ranges, BucketData, BucketRange, FontData, FontResolver, MemorySource, Ordered,
    ResolveOptions, ResolverConfig,
};

const ROOT: &str = "mem://bench";

const SUBSETS: &[(&str, &str)] = &[
    ("latin", "20-7E,A0-17F"),
    ("cyrillic", "20-7E,400-4FF"),
    ("cjk", "20-7E,3000-30FF,4E00-9FFF"),
];

fn source() -> MemorySource {
    let source = MemorySource::new();
    let mut starts = std::collections::BTreeSet::new();
    for (id, range_string) in SUBSETS {
        let font: FontData = serde_json::from_value(serde_json::json!({
            "id": id,
            "ranges": range_string,
            "typeforms": {"sans-serif": {"normal": [400, 700]}},
        }))
        .unwrap();
        source
            .insert_document(ROOT, &font_meta_path(id), 1, &font)
            .unwrap();
        for range in ranges::parse(range_string).unwrap() {
            starts.extend((range.start & !0x7F..=range.end).step_by(128));
        }
    }

    for start in starts {
        let bucket = BucketRange::for_code_point(start);
        let fonts: Ordered<String, String> = SUBSETS
            .iter()
            .map(|(id, range_string)| {
                let parsed = ranges::parse(range_string).unwrap();
                (id.to_string(), coverage::encode(&parsed, bucket))
            })
            .filter(|(_, encoded)| !encoded.is_empty())
            .collect();
        let bucket_data = BucketData {
            selectors: vec![(".*".to_string(), fonts)].into_iter().collect(),
        };
        source
            .insert_document(ROOT, &bucket_path(start), 1, &bucket_data)
            .unwrap();
    }
    source
}

fn resolver() -> FontResolver {
    let config = ResolverConfig::default().with_default_root(ROOT);
    FontResolver::with_config(Arc::new(source()), config).unwrap()
}

fn bench_warm_resolve(c: &mut Criterion) {
    let resolver = resolver();
    let options = ResolveOptions::default().with_lang("en");
    let samples = [
        ("latin", "The quick brown fox jumps over the lazy dog"),
        ("cyrillic", "Съешь же ещё этих мягких французских булок"),
        ("cjk", "我能吞下玻璃而不伤身体。私はガラスを食べられます。"),
        ("mixed", "Hello Привет 你好 café"),
    ];

    let mut group = c.benchmark_group("resolve_warm");
    for (name, text) in samples {
        resolver.resolve(text, &options).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| resolver.resolve(black_box(text), &options).unwrap());
        });
    }
    group.finish();
}

fn bench_cold_resolve(c: &mut Criterion) {
    let resolver = resolver();
    let options = ResolveOptions::default().with_lang("en");
    let text = "Hello Привет 你好";

    c.bench_function("resolve_cold", |b| {
        b.iter(|| {
            resolver.clear_cache();
            resolver.resolve(black_box(text), &options).unwrap()
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let resolver = resolver();
    let options = ResolveOptions::default().with_lang("en");
    let texts: Vec<String> = (0..64)
        .map(|i| format!("Line {i}: Привет 你好 мир"))
        .collect();

    c.bench_function("resolve_batch_64", |b| {
        b.iter(|| resolver.resolve_batch(black_box(&texts), &options));
    });
}

criterion_group!(benches, bench_warm_resolve, bench_cold_resolve, bench_batch);
criterion_main!(benches);
