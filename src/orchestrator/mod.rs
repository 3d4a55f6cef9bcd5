//! Review pipeline: resolve, filter, build, send, render.
//!
//! Stages run strictly in order and the first failure aborts the run;
//! no partial report is produced.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::client::{ClientError, ReviewClient};
use crate::config::{Config, PromptConfig};
use crate::context::{ContextError, ProjectContext, SYSTEM_PROMPT_TEMPLATE};
use crate::diff::filter::{FilterError, PathFilter};
use crate::diff::{self, ResolveError};
use crate::models::ReviewMode;
use crate::output::{self, RenderError};
use crate::prompt::{self, BuildError, PayloadBudget};

/// Errors from a pipeline run, by failing stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The mode resolved to no changes; the backend was not called.
    NothingToReview,
    /// The request that would have been sent.
    DryRun(String),
    /// The rendered review.
    Report(String),
}

/// One review invocation against one repository.
pub struct ReviewPipeline {
    repo_root: PathBuf,
    client: ReviewClient,
    filter: PathFilter,
    prompt: PromptConfig,
    max_output_tokens: u32,
}

impl ReviewPipeline {
    pub fn new(
        repo_root: PathBuf,
        client: ReviewClient,
        filter: PathFilter,
        prompt: PromptConfig,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            repo_root,
            client,
            filter,
            prompt,
            max_output_tokens,
        }
    }

    /// Build a pipeline from loaded configuration.
    pub fn from_config(
        repo_root: PathBuf,
        client: ReviewClient,
        config: &Config,
    ) -> Result<Self, PipelineError> {
        let filter = PathFilter::new(&config.filter.include, &config.filter.exclude)?;
        Ok(Self::new(
            repo_root,
            client,
            filter,
            config.prompt.clone(),
            config.provider.max_output_tokens,
        ))
    }

    /// Run every stage for `mode`.
    pub async fn run(&self, mode: &ReviewMode) -> Result<PipelineOutcome, PipelineError> {
        let changes = diff::resolve(mode, &self.repo_root).await?;
        let changes = self.filter.apply(changes);
        if changes.is_empty() {
            info!(%mode, "nothing to review");
            return Ok(PipelineOutcome::NothingToReview);
        }

        let context = ProjectContext::load(&self.repo_root, &self.prompt).await?;
        let system_prompt = context.append_to(SYSTEM_PROMPT_TEMPLATE);

        let request = prompt::build(
            &system_prompt,
            &mode.label(),
            changes,
            &PayloadBudget::from_config(&self.prompt),
            self.max_output_tokens,
        )?;

        let result = self.client.send(&request).await?;
        if self.client.is_dry_run() {
            return Ok(PipelineOutcome::DryRun(result.raw_markdown));
        }

        let report = output::render(&result, request.label())?;
        Ok(PipelineOutcome::Report(report))
    }
}
