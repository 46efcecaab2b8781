//! Error taxonomy shared by every Rollcall crate.

use thiserror::Error;

/// All errors surfaced by Rollcall library code.
#[derive(Debug, Error)]
pub enum RollcallError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Messaging gateway error: {0}")]
    Gateway(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RollcallError>;

impl RollcallError {
    /// Whether this error means "the entity does not exist" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
