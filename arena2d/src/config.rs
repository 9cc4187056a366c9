use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AssetError, Result};

/// Settings used when resolving and fetching assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory that relative file paths are resolved against.
    /// `None` leaves them relative to the process working directory.
    pub asset_root: Option<PathBuf>,
    /// Total timeout for an HTTP(S) fetch, in milliseconds.
    pub http_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: None,
            http_timeout_ms: 30_000,
            user_agent: concat!("arena2d/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl AssetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative file paths against `root`.
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Parse a config from JSON. Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AssetError::decode("asset config", e))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AssetError::InvalidState(format!("asset config not serializable: {e}")))
    }

    /// Join `path` onto the asset root unless it is already absolute.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.asset_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
