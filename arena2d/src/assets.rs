use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::config::AssetConfig;
use crate::error::{AssetError, Result};

/// Where an asset lives: a local file or a remote HTTP(S) resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    Url(String),
}

impl AssetSource {
    /// Classify a source string by prefix. Anything that does not start with
    /// `http://` or `https://` is treated as a file path.
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::File(PathBuf::from(source))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl From<&str> for AssetSource {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Reads the raw bytes behind an [`AssetSource`].
///
/// Loading is synchronous: file reads and HTTP GETs block the caller.
/// There is no caching and no retry; every call goes back to the source.
#[derive(Clone, Debug, Default)]
pub struct AssetLoader {
    config: AssetConfig,
}

impl AssetLoader {
    pub fn new(config: AssetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Load the bytes named by `source` (path or URL).
    pub fn load_bytes(&self, source: &str) -> Result<Vec<u8>> {
        match AssetSource::parse(source) {
            AssetSource::File(path) => {
                let path = self.config.resolve_path(&path);
                let bytes = fs::read(&path).map_err(|e| AssetError::load(source, e))?;
                log::debug!("Read {} bytes from {:?}", bytes.len(), path);
                Ok(bytes)
            }
            AssetSource::Url(url) => self.fetch(&url),
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.http_timeout())
            .user_agent(self.config.user_agent.as_str())
            .build()
            .map_err(|e| AssetError::load(url, e))?;

        let bytes = client
            .get(url)
            .send()
            .map_err(|e| AssetError::load(url, e))?
            .error_for_status()
            .map_err(|e| AssetError::load(url, e))?
            .bytes()
            .map_err(|e| AssetError::load(url, e))?
            .to_vec();
        log::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}
