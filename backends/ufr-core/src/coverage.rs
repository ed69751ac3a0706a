// this_file: backends/ufr-core/src/coverage.rs

//! Bucket addressing and the packed per-bucket coverage string.
//!
//! A bucket is 128 consecutive code points. Its membership map is packed six
//! bits per character, each group offset by `'0'` so the result stays in
//! printable ASCII (`0x30..=0x6F`). Trailing all-zero groups are dropped, so
//! an uncovered bucket encodes to the empty string.

use crate::CodeRange;

const BUCKET_BITS: u32 = 7;
/// Number of code points per bucket
pub const BUCKET_SIZE: u32 = 1 << BUCKET_BITS;
const BUCKET_POSITION_MASK: u32 = BUCKET_SIZE - 1;
const BITS_PER_CHAR: u32 = 6;
const GROUPS: usize = BUCKET_SIZE.div_ceil(BITS_PER_CHAR) as usize;
const ENCODING_OFFSET: u8 = 0x30;

/// Packed coverage of one font subset within one bucket
pub type EncodedCoverage = String;

/// Inclusive `(start, end)` address range of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketRange {
    pub start: u32,
    pub end: u32,
}

impl BucketRange {
    /// Bucket containing `code_point`
    pub fn for_code_point(code_point: u32) -> Self {
        let start = code_point & !BUCKET_POSITION_MASK;
        Self {
            start,
            end: start + BUCKET_SIZE - 1,
        }
    }

    /// Unicode plane (0-16) the bucket sits in
    pub fn plane(&self) -> u32 {
        plane(self.start)
    }

    pub fn contains(&self, code_point: u32) -> bool {
        self.start <= code_point && code_point <= self.end
    }
}

/// Unicode plane of a code point
pub fn plane(code_point: u32) -> u32 {
    (code_point & 0xFF_0000) >> 16
}

/// Alias for [`BucketRange::for_code_point`]
pub fn bucket_address(code_point: u32) -> BucketRange {
    BucketRange::for_code_point(code_point)
}

/// Encode the part of `ranges` that falls inside `bucket`.
pub fn encode(ranges: &[CodeRange], bucket: BucketRange) -> EncodedCoverage {
    let mut groups = [0u8; GROUPS];
    for range in ranges {
        let start = range.start.max(bucket.start);
        let end = range.end.min(bucket.end);
        if start > end {
            continue;
        }
        for cp in start..=end {
            let pos = cp - bucket.start;
            groups[(pos / BITS_PER_CHAR) as usize] |= 1 << (pos % BITS_PER_CHAR);
        }
    }

    let used = groups.iter().rposition(|&g| g != 0).map_or(0, |i| i + 1);
    groups[..used]
        .iter()
        .map(|&g| char::from(g + ENCODING_OFFSET))
        .collect()
}

/// Test whether `code_point` is set in an encoded bucket.
///
/// Only the low seven bits of the code point are used; a string shorter than
/// the needed group reads as zero. Bytes below the offset count as zero.
pub fn decode(encoded: &str, code_point: u32) -> bool {
    let pos = code_point & BUCKET_POSITION_MASK;
    let group = encoded
        .as_bytes()
        .get((pos / BITS_PER_CHAR) as usize)
        .map_or(0, |&b| b.saturating_sub(ENCODING_OFFSET));
    group & (1 << (pos % BITS_PER_CHAR)) != 0
}
