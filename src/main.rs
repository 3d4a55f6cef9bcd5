//! diffcritic: review a git change set with a language model.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use diffcritic::client::ReviewClient;
use diffcritic::config::Config;
use diffcritic::constants;
use diffcritic::diff::git;
use diffcritic::env::Env;
use diffcritic::orchestrator::{PipelineOutcome, ReviewPipeline};
use diffcritic::output;
use diffcritic::providers::anthropic::AnthropicBackend;
use diffcritic::providers::retry::RetryPolicy;

use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::args::Cli;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        format!("warn,{}=debug", constants::APP_NAME)
    } else {
        "warn".to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Mode conflicts are usage errors, caught before any git query.
    let mode = cli.validate_mode().map_err(|e| anyhow!(e))?;

    let repo_root = git::find_repo_root(&cli.project)
        .await
        .with_context(|| format!("cannot review {}", cli.project.display()))?;

    let env = Env::real();
    let mut config = Config::load(Some(&repo_root), &env).context("failed to load config")?;
    apply_cli_overrides(&mut config, &cli);
    debug!(?config, "effective configuration");

    let client = build_client(&config, cli.dry_run)?;
    let pipeline = ReviewPipeline::from_config(repo_root, client, &config)?;

    match pipeline.run(&mode).await? {
        PipelineOutcome::NothingToReview => {
            cli::print_notice("Nothing to review.");
        }
        PipelineOutcome::DryRun(request) => {
            cli::print_dry_run_banner(&config.provider.model);
            output::write_output(cli.output.as_deref(), &request)?;
        }
        PipelineOutcome::Report(report) => {
            output::write_output(cli.output.as_deref(), &report)?;
        }
    }

    Ok(())
}

/// CLI flags take precedence over every config layer.
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref model) = cli.model {
        config.provider.model = model.clone();
    }
    if let Some(max_tokens) = cli.max_tokens {
        config.provider.max_output_tokens = max_tokens;
    }
    if let Some(ref style_dir) = cli.style_dir {
        config.prompt.style_dir = style_dir.clone();
    }
}

/// Build the review client, failing fast on a missing credential unless
/// this is a dry run.
fn build_client(config: &Config, dry_run: bool) -> Result<ReviewClient> {
    if dry_run {
        return Ok(ReviewClient::dry_run(config.provider.model.clone()));
    }

    let Some(ref api_key) = config.provider.api_key else {
        bail!(
            "no API key found. Set {} or {}, or use --dry-run to inspect the request.",
            constants::ENV_API_KEY,
            constants::ENV_ANTHROPIC_API_KEY
        );
    };

    let deadline = Duration::from_secs(config.provider.timeout_secs);
    let backend = AnthropicBackend::new(api_key, config.provider.base_url.as_deref(), deadline)
        .context("failed to set up the review backend")?;

    Ok(ReviewClient::new(
        Arc::new(backend),
        config.provider.model.clone(),
        RetryPolicy::from(&config.retry),
        deadline,
    ))
}
