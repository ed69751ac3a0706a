// this_file: fuzz/fuzz_targets/range_string.rs

#![no_main]

use libfuzzer_sys::fuzz_target;
use ufr_core::{ranges, CodePointSet};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(parsed) = ranges::parse(input) else {
        return;
    };

    // Whatever parses must survive a trip through the set and back.
    let set = CodePointSet::from_ranges(&parsed);
    let serialized = set.to_range_string();
    let reparsed = CodePointSet::from_range_string(&serialized).unwrap();
    assert_eq!(reparsed.ranges(), set.ranges());
    assert_eq!(ranges::serialize_ranges(&parsed), serialized);
});
