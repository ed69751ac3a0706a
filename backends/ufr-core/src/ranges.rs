// this_file: backends/ufr-core/src/ranges.rs

//! Parsing and serialization of unicode range strings.
//!
//! A range string is a comma separated list of hex terms, each either a
//! single code point (`41`) or an inclusive pair (`41-5A`), optionally
//! prefixed with `U+` as in CSS `unicode-range`.

use crate::{Result, UfrError, MAX_CODE_POINT};
use std::fmt;

/// Inclusive range of code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeRange {
    pub start: u32,
    pub end: u32,
}

impl CodeRange {
    /// Create a range. Callers pass `start <= end`.
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Range holding a single code point
    pub const fn single(code_point: u32) -> Self {
        Self {
            start: code_point,
            end: code_point,
        }
    }

    #[inline]
    pub fn contains(&self, code_point: u32) -> bool {
        self.start <= code_point && code_point <= self.end
    }

    /// Number of code points in the range
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// A range always holds at least one code point
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the code points of the range in ascending order
    pub fn iter(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl fmt::Display for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "U+{:04X}", self.start)
        } else {
            write!(f, "U+{:04X}-{:04X}", self.start, self.end)
        }
    }
}

/// Parse a range string into its ranges, in declaration order.
///
/// Repeated, leading and trailing commas are tolerated, as is a `U+`
/// prefix on each term.
pub fn parse(input: &str) -> Result<Vec<CodeRange>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| parse_term(input, term))
        .collect()
}

fn parse_term(input: &str, term: &str) -> Result<CodeRange> {
    let term = term
        .strip_prefix("U+")
        .or_else(|| term.strip_prefix("u+"))
        .unwrap_or(term);

    let mut parts = term.splitn(2, '-');
    let start = parse_hex(input, parts.next().unwrap_or_default())?;
    let end = match parts.next() {
        Some(part) => parse_hex(input, part)?,
        None => start,
    };

    if start > end {
        return Err(UfrError::malformed_range(
            input,
            format!("range start {start:X} is after end {end:X}"),
        ));
    }
    Ok(CodeRange { start, end })
}

fn parse_hex(input: &str, token: &str) -> Result<u32> {
    let token = token.trim();
    let token = token
        .strip_prefix("U+")
        .or_else(|| token.strip_prefix("u+"))
        .unwrap_or(token);
    if token.is_empty() || token.len() > 8 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(UfrError::malformed_range(
            input,
            format!("'{token}' is not a hex code point"),
        ));
    }
    let value = u32::from_str_radix(token, 16)
        .map_err(|e| UfrError::malformed_range(input, e.to_string()))?;
    if value > MAX_CODE_POINT {
        return Err(UfrError::malformed_range(
            input,
            format!("{value:X} is beyond U+10FFFF"),
        ));
    }
    Ok(value)
}

/// Sort and coalesce ranges so that none overlap or touch.
pub fn normalize(ranges: &[CodeRange]) -> Vec<CodeRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort_unstable();

    let mut merged: Vec<CodeRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(prev) if range.start <= prev.end.saturating_add(1) => {
                prev.end = prev.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Serialize a set of code points to an uppercase range string.
///
/// Input order and duplicates do not matter.
pub fn serialize<I>(code_points: I) -> String
where
    I: IntoIterator<Item = u32>,
{
    let mut points: Vec<u32> = code_points.into_iter().collect();
    points.sort_unstable();
    points.dedup();

    let mut ranges: Vec<CodeRange> = Vec::new();
    for cp in points {
        match ranges.last_mut() {
            Some(prev) if prev.end.checked_add(1) == Some(cp) => prev.end = cp,
            _ => ranges.push(CodeRange::single(cp)),
        }
    }
    join(&ranges)
}

/// Serialize ranges, merging overlapping and adjacent ones first.
pub fn serialize_ranges(ranges: &[CodeRange]) -> String {
    join(&normalize(ranges))
}

fn join(ranges: &[CodeRange]) -> String {
    ranges
        .iter()
        .map(|r| {
            if r.start == r.end {
                format!("{:X}", r.start)
            } else {
                format!("{:X}-{:X}", r.start, r.end)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Lazily expand a range string into its code points.
///
/// The string is validated up front; the returned iterator is finite and
/// can be cloned to restart the walk.
pub fn code_points(input: &str) -> Result<impl Iterator<Item = u32> + Clone> {
    let ranges = parse(input)?;
    Ok(ranges.into_iter().flat_map(|r| r.start..=r.end))
}

/// Visit every code point of a range string, range by range in ascending
/// order within each range.
pub fn for_each_code_point<F>(input: &str, mut visitor: F) -> Result<()>
where
    F: FnMut(u32),
{
    for range in parse(input)? {
        for cp in range.start..=range.end {
            visitor(cp);
        }
    }
    Ok(())
}
