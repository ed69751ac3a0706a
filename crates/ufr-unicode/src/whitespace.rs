// this_file: crates/ufr-unicode/src/whitespace.rs

//! `White_Space=yes` membership backed by ICU4X compiled property data.

use icu_properties::sets;

/// Whether `code_point` has the Unicode `White_Space` property.
#[inline]
pub fn is_whitespace(code_point: u32) -> bool {
    sets::white_space().contains32(code_point)
}
