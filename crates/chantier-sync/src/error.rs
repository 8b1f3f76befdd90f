use thiserror::Error;

use crate::classify::{UpstreamFailure, classify_failure};

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no API key configured")]
    MissingApiKey,
}

impl UpstreamError {
    /// Classify this failure from its message.
    pub fn failure(&self) -> UpstreamFailure {
        match self {
            Self::MissingApiKey => UpstreamFailure::InvalidCredentials,
            other => classify_failure(&other.to_string()),
        }
    }
}
