// this_file: backends/ufr-http/src/lib.rs

//! Fetch index documents over HTTP(S).

use log::debug;
use std::time::Duration;
use ufr_core::utils::join_root;
use ufr_core::{DataSource, Result, UfrError};
use ureq::Agent;

/// Documents above this size are refused
pub const DEFAULT_MAX_BODY_BYTES: u64 = 4 * 1024 * 1024;

const USER_AGENT: &str = concat!("ufr/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP data source. Non-2xx responses are fetch failures.
pub struct HttpSource {
    agent: Agent,
    max_body_bytes: u64,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Source whose requests give up after `timeout` in total.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSource for HttpSource {
    fn fetch(&self, root: &str, path: &str) -> Result<String> {
        let url = join_root(root, path);
        debug!(target: "ufr::http", "GET {url}");

        let mut response = self
            .agent
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| UfrError::fetch(&url, e))?;

        response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_string()
            .map_err(|e| UfrError::fetch(&url, e))
    }

    fn name(&self) -> &str {
        "http"
    }
}
