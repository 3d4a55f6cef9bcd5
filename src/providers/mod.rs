//! Review backend abstraction.
//!
//! [`ReviewBackend`] is one request/response exchange with a model
//! endpoint. Retries, deadlines and cost live in the review client on
//! top of it, so backends stay thin and mockable.

pub mod anthropic;
pub mod pricing;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a single backend exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid credential: {0}")]
    Credential(String),
}

impl BackendError {
    /// HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// What is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// What the backend answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// One model endpoint.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Perform a single exchange. No retries.
    async fn complete(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError>;
}
