use thiserror::Error;

/// Application-wide error types.
///
/// Data-layer errors (`Connection`, `Database`) are always fatal: jobs let
/// them propagate so the platform marks the invocation failed. Per-recipient
/// send failures are caught at the job level.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Send error: {0}")]
    Send(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
