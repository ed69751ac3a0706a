// this_file: crates/ufr-resolver/src/config.rs

//! Resolver configuration and per-call options.

use serde::{Deserialize, Serialize};
use ufr_core::utils::normalize_root;
use ufr_core::{FontCategory, FontStyle, Result, TrieLayout, UfrError};

/// Public location of the published font index.
pub const DEFAULT_DATA_URL: &str =
    "https://cdn.jsdelivr.net/gh/lojjic/unicode-font-resolver/packages/data";

/// Settings shared by every call made through one resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Root used when a call names none, and the fallback when a custom
    /// root fails
    pub default_root: String,

    /// Expected first element of every document envelope
    pub schema_version: u32,

    /// Subset used for code points no subset covers
    pub fallback_subset: String,

    /// Extension appended to font file references
    pub font_file_extension: String,

    /// Compiled language selectors kept per resolver
    pub selector_cache_size: usize,

    /// Trie shape for coverage sets
    pub layout: TrieLayout,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_root: DEFAULT_DATA_URL.to_string(),
            schema_version: 1,
            fallback_subset: "latin".to_string(),
            font_file_extension: "woff".to_string(),
            selector_cache_size: 256,
            layout: TrieLayout::default(),
        }
    }
}

impl ResolverConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| UfrError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_default_root(mut self, root: impl Into<String>) -> Self {
        self.default_root = root.into();
        self
    }

    pub fn with_fallback_subset(mut self, subset: impl Into<String>) -> Self {
        self.fallback_subset = subset.into();
        self
    }

    pub fn with_layout(mut self, layout: TrieLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(UfrError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if normalize_root(&self.default_root).is_empty() {
            return invalid("default_root must not be empty");
        }
        if self.fallback_subset.trim().is_empty() {
            return invalid("fallback_subset must not be empty");
        }
        if self.font_file_extension.trim().is_empty() {
            return invalid("font_file_extension must not be empty");
        }
        if self.selector_cache_size == 0 {
            return invalid("selector_cache_size must be at least 1");
        }
        // Deserialization does not go through the layout constructor.
        TrieLayout::new(self.layout.widths().to_vec())?;
        Ok(())
    }
}

/// Options of one resolve call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveOptions {
    /// BCP-47 style tag; detected from the text when absent
    pub lang: Option<String>,
    pub category: FontCategory,
    pub style: FontStyle,
    pub weight: u16,
    /// Root of the data tree; the configured default when absent
    pub data_root: Option<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            lang: None,
            category: FontCategory::default(),
            style: FontStyle::default(),
            weight: 400,
            data_root: None,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_category(mut self, category: FontCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_data_root(mut self, root: impl Into<String>) -> Self {
        self.data_root = Some(root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.fallback_subset, "latin");
        assert_eq!(config.font_file_extension, "woff");
        assert_eq!(config.layout.widths(), &[4, 2, 2, 2, 3, 4]);
        assert!(config.validate().is_ok());

        let options = ResolveOptions::default();
        assert_eq!(options.weight, 400);
        assert_eq!(options.category, FontCategory::SansSerif);
        assert_eq!(options.style, FontStyle::Normal);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config =
            ResolverConfig::from_json(r#"{"default_root": "/srv/ufr", "fallback_subset": "emoji"}"#)
                .unwrap();
        assert_eq!(config.default_root, "/srv/ufr");
        assert_eq!(config.fallback_subset, "emoji");
        assert_eq!(config.selector_cache_size, 256);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        for json in [
            r#"{"default_root": "/"}"#,
            r#"{"selector_cache_size": 0}"#,
            r#"{"font_file_extension": " "}"#,
            r#"{"layout": [7, 4]}"#,
            r#"{"layout": []}"#,
            r#"{"schema_version": "one"}"#,
        ] {
            let err = ResolverConfig::from_json(json).unwrap_err();
            assert!(
                matches!(err, UfrError::InvalidConfig { .. } | UfrError::InvalidLayout { .. }),
                "{json} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_options_from_json() {
        let options: ResolveOptions = serde_json::from_str(
            r#"{"lang": "ja", "category": "serif", "style": "italic", "dataRoot": "/data"}"#,
        )
        .unwrap();
        assert_eq!(options.lang.as_deref(), Some("ja"));
        assert_eq!(options.category, FontCategory::Serif);
        assert_eq!(options.style, FontStyle::Italic);
        assert_eq!(options.weight, 400);
        assert_eq!(options.data_root.as_deref(), Some("/data"));
    }
}
