use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog material not found: {0}")]
    NotFound(String),

    #[error("invalid catalog material: {0}")]
    Invalid(String),

    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
