use cacheview_core::LoadError;
use thiserror::Error;

/// Errors from a single HTTP download.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),
}

impl From<FetchError> for LoadError {
    fn from(e: FetchError) -> Self {
        LoadError::Transport(e.to_string())
    }
}
