//! Review client: sends a built request to the backend.
//!
//! Adds what a bare [`ReviewBackend`] exchange lacks: transient failure
//! retries with jittered exponential backoff, one overall deadline
//! across attempts and sleeps, local cost estimation, and a dry-run mode
//! that shows what would be sent without sending it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{ReviewRequest, ReviewResult};
use crate::providers::pricing;
use crate::providers::retry::{RetryPolicy, classify_error};
use crate::providers::{BackendError, BackendRequest, BackendResponse, ReviewBackend};

/// Errors from the review client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("review backend still failing after {attempts} attempts: {last}")]
    TransientNetwork { attempts: u32, last: String },

    #[error("review request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("rate limit still exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("review backend rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("review backend returned a malformed body: {0}")]
    MalformedBody(String),
}

/// How requests are handled.
#[derive(Clone)]
pub enum ClientMode {
    /// Send to a real backend.
    Live(Arc<dyn ReviewBackend>),
    /// Render the request instead of sending it.
    DryRun,
}

/// Sends review requests for one model.
#[derive(Clone)]
pub struct ReviewClient {
    mode: ClientMode,
    model: String,
    retry: RetryPolicy,
    deadline: Duration,
}

impl ReviewClient {
    /// A client that talks to `backend`, giving up after `deadline`.
    pub fn new(
        backend: Arc<dyn ReviewBackend>,
        model: impl Into<String>,
        retry: RetryPolicy,
        deadline: Duration,
    ) -> Self {
        Self {
            mode: ClientMode::Live(backend),
            model: model.into(),
            retry,
            deadline,
        }
    }

    /// A client that never touches the network.
    pub fn dry_run(model: impl Into<String>) -> Self {
        Self {
            mode: ClientMode::DryRun,
            model: model.into(),
            retry: RetryPolicy::default(),
            deadline: Duration::ZERO,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self.mode, ClientMode::DryRun)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `request` and return the backend's answer with usage and cost.
    ///
    /// In dry-run mode the result's markdown is the rendered request,
    /// with zero tokens and zero cost.
    pub async fn send(&self, request: &ReviewRequest) -> Result<ReviewResult, ClientError> {
        let backend = match &self.mode {
            ClientMode::DryRun => {
                info!(model = %self.model, "dry run, not contacting the review backend");
                return Ok(ReviewResult {
                    raw_markdown: render_dry_run(request, &self.model),
                    input_tokens: 0,
                    output_tokens: 0,
                    estimated_cost_usd: Some(0.0),
                });
            }
            ClientMode::Live(backend) => backend,
        };

        let backend_request = BackendRequest {
            model: self.model.clone(),
            system: request.system_prompt().to_string(),
            user: request.payload().to_string(),
            max_tokens: request.max_output_tokens(),
        };

        let response = tokio::time::timeout(
            self.deadline,
            self.send_with_retries(backend.as_ref(), &backend_request),
        )
        .await
        .map_err(|_| ClientError::Timeout(self.deadline))??;

        let estimated_cost_usd =
            pricing::estimate_cost(&self.model, response.input_tokens, response.output_tokens);
        if estimated_cost_usd.is_none() {
            warn!(model = %self.model, "model not in price table, cost unknown");
        }
        info!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost = ?estimated_cost_usd,
            "review received"
        );

        Ok(ReviewResult {
            raw_markdown: response.content,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            estimated_cost_usd,
        })
    }

    async fn send_with_retries(
        &self,
        backend: &dyn ReviewBackend,
        request: &BackendRequest,
    ) -> Result<BackendResponse, ClientError> {
        let max_attempts = self.retry.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts, "calling review backend");

            let err = match backend.complete(request).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !self.retry.is_transient(&err) {
                return Err(self.fatal(err));
            }
            if attempt >= max_attempts {
                return Err(match err.status() {
                    Some(429) => ClientError::RateLimitExceeded { attempts: attempt },
                    _ => ClientError::TransientNetwork {
                        attempts: attempt,
                        last: err.to_string(),
                    },
                });
            }

            let backoff = self.retry.backoff(attempt - 1);
            warn!(
                attempt,
                max_attempts,
                reason = classify_error(&err),
                backoff_ms = backoff.as_millis() as u64,
                "transient review backend failure, retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    fn fatal(&self, err: BackendError) -> ClientError {
        match err {
            BackendError::Status {
                status: 401 | 403,
                message,
            } => ClientError::Auth(message),
            BackendError::Credential(message) => ClientError::Auth(message),
            BackendError::Status { status, message } => ClientError::Rejected { status, message },
            BackendError::Timeout => ClientError::Timeout(self.deadline),
            BackendError::Decode(message) => ClientError::MalformedBody(message),
            // only reachable when a custom policy marks connection errors fatal
            BackendError::Connection(message) => ClientError::TransientNetwork {
                attempts: 1,
                last: message,
            },
        }
    }
}

/// Render exactly what would be sent for `request`.
pub fn render_dry_run(request: &ReviewRequest, model: &str) -> String {
    let mut out = format!("# Dry run: {}\n\n", request.label());
    out.push_str(&format!("- Model: {model}\n"));
    out.push_str(&format!("- Max output tokens: {}\n", request.max_output_tokens()));
    out.push_str(&format!(
        "- Files included: {}, omitted: {}\n",
        request.changes().len(),
        request.omitted().len()
    ));
    out.push_str("\n## System prompt\n\n");
    out.push_str(request.system_prompt().trim_end());
    out.push_str("\n\n## User message\n\n");
    out.push_str(request.payload().trim_end());
    out.push('\n');
    out
}
