//! REST client seam
//!
//! The lifecycle talks to the configuration API only through
//! [`TaskClient`]; transport, authentication and retries live behind it.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Client errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Object does not exist
    #[error("recurring task not found")]
    NotFound,

    /// Server rejected the request
    #[error("server returned {status}: {detail}")]
    Server { status: u16, detail: String },

    /// Request never got an answer
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Check if the object is missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Check if retrying the same request may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound => false,
            Self::Server { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) => true,
        }
    }
}

/// Recurring task endpoints of the configuration API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskClient: Send + Sync {
    /// Fetch an object by id
    async fn get(&self, id: &str) -> Result<JsonValue, ClientError>;

    /// Create an object; returns the stored representation
    async fn create(&self, payload: JsonValue) -> Result<JsonValue, ClientError>;

    /// Apply a patch body; returns the stored representation
    async fn patch(&self, id: &str, payload: JsonValue) -> Result<JsonValue, ClientError>;

    /// Delete an object
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}

#[async_trait]
impl<T: TaskClient + ?Sized> TaskClient for Arc<T> {
    async fn get(&self, id: &str) -> Result<JsonValue, ClientError> {
        (**self).get(id).await
    }

    async fn create(&self, payload: JsonValue) -> Result<JsonValue, ClientError> {
        (**self).create(payload).await
    }

    async fn patch(&self, id: &str, payload: JsonValue) -> Result<JsonValue, ClientError> {
        (**self).patch(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        (**self).delete(id).await
    }
}
