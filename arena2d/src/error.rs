use thiserror::Error;

/// Errors raised while loading or driving an asset.
#[derive(Clone, Debug, Error)]
pub enum AssetError {
    /// The asset could not be read (missing file, unreachable URL, HTTP error).
    #[error("failed to load {asset}: {reason}")]
    ResourceLoad { asset: String, reason: String },

    /// The bytes were read but the decoder rejected them.
    #[error("failed to decode {asset}: {reason}")]
    Decode { asset: String, reason: String },

    /// The audio device or line could not be acquired.
    #[error("audio unavailable: {0}")]
    Audio(String),

    /// The operation is not valid in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl AssetError {
    pub(crate) fn load(asset: &str, reason: impl ToString) -> Self {
        Self::ResourceLoad {
            asset: asset.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(asset: &str, reason: impl ToString) -> Self {
        Self::Decode {
            asset: asset.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures that happened while acquiring the asset
    /// (read, decode or device), as opposed to lifecycle misuse.
    pub fn is_load_failure(&self) -> bool {
        !matches!(self, Self::InvalidState(_))
    }
}

pub type Result<T> = std::result::Result<T, AssetError>;
