// this_file: backends/ufr-core/src/utils.rs

//! Path conventions of the data tree and document envelope handling.

use crate::coverage::BucketRange;
use crate::types::{FontCategory, FontStyle};
use crate::{Result, UfrError};
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::Value;

/// Path of the bucket document holding `code_point`,
/// e.g. `index/plane0/6580-65ff.json`.
pub fn bucket_path(code_point: u32) -> String {
    let bucket = BucketRange::for_code_point(code_point);
    format!(
        "index/plane{}/{:x}-{:x}.json",
        bucket.plane(),
        bucket.start,
        bucket.end
    )
}

/// Path of a font subset's metadata document
pub fn font_meta_path(font_id: &str) -> String {
    format!("font-meta/{font_id}.json")
}

/// Reference of one concrete font file variant
pub fn font_file_path(
    font_id: &str,
    category: FontCategory,
    style: FontStyle,
    weight: u16,
    extension: &str,
) -> String {
    format!("font-files/{font_id}/{category}.{style}.{weight}.{extension}")
}

/// Strip trailing slashes so roots and paths join with exactly one.
pub fn normalize_root(root: &str) -> &str {
    root.trim_end_matches('/')
}

/// Join a root and a relative path.
pub fn join_root(root: &str, path: &str) -> String {
    let root = normalize_root(root);
    if root.is_empty() {
        path.to_string()
    } else {
        format!("{root}/{path}")
    }
}

/// Unwrap a `[schemaVersion, payload]` document, checking the version.
///
/// The payload is decoded straight from its source text so object keys
/// reach the target type in document order.
pub fn decode_envelope<T: DeserializeOwned>(path: &str, body: &str, expected: u32) -> Result<T> {
    let items: Vec<Box<RawValue>> = serde_json::from_str(body).map_err(|_| {
        UfrError::invalid_document(path, "expected a [schemaVersion, payload] array")
    })?;
    let [version, payload] = items.as_slice() else {
        return Err(UfrError::invalid_document(
            path,
            format!("envelope has {} elements, expected 2", items.len()),
        ));
    };

    let version: Value =
        serde_json::from_str(version.get()).map_err(|e| UfrError::invalid_document(path, e))?;
    if version.as_u64() != Some(u64::from(expected)) {
        return Err(UfrError::SchemaVersionMismatch {
            path: path.to_string(),
            expected,
            found: version.to_string(),
        });
    }

    serde_json::from_str(payload.get()).map_err(|e| UfrError::invalid_document(path, e))
}
