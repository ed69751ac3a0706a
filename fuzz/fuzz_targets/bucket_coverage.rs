// this_file: fuzz/fuzz_targets/bucket_coverage.rs

#![no_main]

use libfuzzer_sys::fuzz_target;
use ufr_core::coverage::{decode, encode, BucketRange};
use ufr_core::CodeRange;

fuzz_target!(|data: &[u8]| {
    // Arbitrary strings must decode without panicking.
    if let Ok(encoded) = std::str::from_utf8(data) {
        for position in 0..128 {
            let _ = decode(encoded, 0x4E00 + position);
        }
    }

    // Pairs of bytes become in-bucket ranges; encoding must agree with them.
    let bucket = BucketRange::for_code_point(0x4E00);
    let ranges: Vec<CodeRange> = data
        .chunks_exact(2)
        .map(|pair| {
            let (a, b) = (u32::from(pair[0] & 0x7F), u32::from(pair[1] & 0x7F));
            CodeRange::new(bucket.start + a.min(b), bucket.start + a.max(b))
        })
        .collect();
    let encoded = encode(&ranges, bucket);
    for cp in bucket.start..=bucket.end {
        let expected = ranges.iter().any(|range| range.contains(cp));
        assert_eq!(decode(&encoded, cp), expected);
    }
});
