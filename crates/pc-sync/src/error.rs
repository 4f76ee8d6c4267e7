use pc_core::BoxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid session json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid box: {0}")]
    Box(#[from] BoxError),
    #[error("point count task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Usage(String),
}
