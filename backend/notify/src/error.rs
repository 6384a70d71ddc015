use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("No content to send")]
    NoContent,

    #[error("Notifier misconfigured: {0}")]
    Misconfigured(String),

    #[error("Error sending HTTP request: {0}")]
    Delivery(#[from] reqwest::Error),

    #[error("Received non-success status code: {0}")]
    Rejected(StatusCode),

    #[error("Error publishing message: {0}")]
    Publish(#[from] redis::RedisError),

    #[error("Error creating JSON payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

impl NotifyError {
    /// Expected outcomes that should not page anyone.
    pub fn is_benign(&self) -> bool {
        matches!(self, NotifyError::NoContent)
    }
}
