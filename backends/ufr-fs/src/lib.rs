// this_file: backends/ufr-fs/src/lib.rs

//! Serve index documents from a local copy of the data tree.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use log::trace;
use std::fs;
use ufr_core::{DataSource, Result, UfrError};

/// Reads documents from disk.
///
/// Roots are directories; relative roots are taken relative to the base
/// directory. A `file://` prefix on a root is accepted.
pub struct FsSource {
    base: Utf8PathBuf,
}

impl FsSource {
    pub fn new(base: impl Into<Utf8PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Source resolving relative roots against the working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    pub fn base(&self) -> &Utf8Path {
        &self.base
    }

    fn locate(&self, root: &str, path: &str) -> Result<Utf8PathBuf> {
        let relative = Utf8Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Utf8Component::Normal(_) | Utf8Component::CurDir))
        {
            return Err(UfrError::fetch(path, "path escapes the data root"));
        }

        let root = Utf8Path::new(root.strip_prefix("file://").unwrap_or(root));
        let dir = if root.is_absolute() {
            root.to_path_buf()
        } else {
            self.base.join(root)
        };
        Ok(dir.join(relative))
    }
}

impl DataSource for FsSource {
    fn fetch(&self, root: &str, path: &str) -> Result<String> {
        let file = self.locate(root, path)?;
        trace!(target: "ufr::fs", "Reading {file}");
        fs::read_to_string(&file).map_err(|e| UfrError::fetch(file.as_str(), e))
    }

    fn name(&self) -> &str {
        "fs"
    }
}
