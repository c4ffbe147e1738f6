// ================================================================
// File: fogon-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A send (or other identity-requiring operation) was attempted with no
    /// resolved local user.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("store read failed: {0}")]
    StoreRead(String),

    #[error("store write failed: {0}")]
    StoreWrite(String),

    /// Channel-level subscription failure. Non-fatal; the transport owns
    /// reconnection.
    #[error("subscription error: {0}")]
    Subscription(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// A send was rejected because an earlier send has not completed yet.
    #[error("send already in flight")]
    SendInFlight,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Validation(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Validation(s.to_string())
    }
}
