// this_file: backends/ufr-core/src/diagnostics.rs

//! Per-call resolution diagnostics used for structured debug logging.

use log::{debug, log_enabled, warn, Level};

/// Counters collected over one resolve call.
#[derive(Debug, Default, Clone)]
pub struct ResolveDiagnostics {
    pub text_units: usize,
    pub code_points: usize,
    pub buckets: usize,
    pub fonts: usize,
    pub carried_forward: usize,
    pub font_references: usize,
    /// Code points no subset covered, which fell back to the default subset
    pub uncovered: usize,
    /// First uncovered code point, kept for the warning
    pub first_uncovered: Option<u32>,
    pub fell_back_to_default_root: bool,
}

impl ResolveDiagnostics {
    pub fn new(text_units: usize) -> Self {
        Self {
            text_units,
            ..Self::default()
        }
    }

    /// Record one uncovered code point.
    pub fn record_uncovered(&mut self, code_point: u32) {
        debug!(target: "ufr::resolve", "No font coverage for U+{code_point:04X}");
        self.uncovered += 1;
        self.first_uncovered.get_or_insert(code_point);
    }

    /// Emit the call summary. Uncovered code points produce a single warning
    /// per call; everything else is debug level.
    pub fn log(&self, fallback_subset: &str) {
        if let Some(first) = self.first_uncovered {
            warn!(
                target: "ufr::resolve",
                "{count} code point(s) had no font coverage (first U+{first:04X}); using '{fallback_subset}'",
                count = self.uncovered,
            );
        }

        if log_enabled!(Level::Debug) {
            debug!(
                target: "ufr::resolve",
                "units={units} code_points={cps} buckets={buckets} fonts={fonts} carried={carried} references={refs} uncovered={uncovered} root_fallback={fallback}",
                units = self.text_units,
                cps = self.code_points,
                buckets = self.buckets,
                fonts = self.fonts,
                carried = self.carried_forward,
                refs = self.font_references,
                uncovered = self.uncovered,
                fallback = self.fell_back_to_default_root,
            );
        }
    }
}
