//! # AI Daily Digest
//!
//! Gathers the day's AI news from a search backend, summarizes each article
//! with an LLM, fact-checks the key points against trusted sources, and
//! compiles everything into a dated Markdown digest.
//!
//! ## Usage
//!
//! ```sh
//! SERPER_API_KEY=... ai_daily_digest --config config.yaml --output-dir ./digests
//! ```
//!
//! ## Architecture
//!
//! One run is four strictly ordered stages:
//! 1. **Harvest**: one news search, filtered to trusted and recent articles
//! 2. **Summarize**: an LLM summary with key points per article
//! 3. **Verify**: each key point searched against trusted domains, then scored
//! 4. **Compile**: Markdown digest, persisted as `ai_digest_YYYY-MM-DD.md`

use awful_aj::{config as aj_config, config_dir, template};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod api;
mod cli;
mod config;
mod content;
mod error;
mod fetcher;
mod judge;
mod models;
mod outputs;
mod pipeline;
mod search;
mod summarizer;
mod temporal;
mod trust;
mod utils;
mod verifier;

use api::{AskFnWrapper, RetryAsk};
use cli::Cli;
use config::DigestConfig;
use content::ContentFetcher;
use error::DigestError;
use outputs::json::write_digest_json;
use pipeline::DigestPipeline;
use search::SerperClient;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "No .env file loaded");
    }
    let args = Cli::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ai_daily_digest failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<(), DigestError> {
    let start_time = std::time::Instant::now();
    info!("ai_daily_digest starting up");
    debug!(config = %args.config, output_dir = %args.output_dir, "Parsed CLI arguments");

    // ---- Configuration: everything fatal happens before any stage runs ----
    let config = DigestConfig::load(&args.config).await?;
    let api_key = args
        .serper_api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| DigestError::Configuration("SERPER_API_KEY is not set".to_string()))?;
    ensure_writable_dir(&args.output_dir).await.map_err(|e| {
        DigestError::Configuration(format!(
            "output directory {} is not writable: {e}",
            args.output_dir
        ))
    })?;

    let timeout = Duration::from_secs(config.api.serper.timeout_secs);
    let backend = SerperClient::new(api_key, &config.api.serper.endpoint, timeout)?;

    let aj_config_path = match &args.aj_config {
        Some(path) => path.clone(),
        None => config_dir()
            .map_err(|e| DigestError::Configuration(format!("cannot locate awful_aj config dir: {e}")))?
            .join("config.yaml")
            .to_string_lossy()
            .into_owned(),
    };
    let aj = aj_config::load_config(&aj_config_path).map_err(|e| {
        DigestError::Configuration(format!("cannot load LLM config {aj_config_path}: {e}"))
    })?;
    info!(path = %aj_config_path, "Loaded LLM configuration");

    let summarizer_template = load_template(&config.generation.summarizer_template).await?;
    let verifier_template = if config.generation.use_judge {
        Some(load_template(&config.generation.verifier_template).await?)
    } else {
        None
    };

    // ---- Pipeline wiring ----
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling run");
            ctrl_c_token.cancel();
        }
    });

    let summarizer = RetryAsk::from_config(
        AskFnWrapper {
            config: &aj,
            template: &summarizer_template,
        },
        &config.generation,
    );
    let mut pipeline = DigestPipeline::new(&config, &backend, summarizer, cancel);
    if let Some(template) = &verifier_template {
        pipeline = pipeline.with_judge(RetryAsk::from_config(
            AskFnWrapper {
                config: &aj,
                template,
            },
            &config.generation,
        ));
    }
    if config.article_limits.fetch_full_content {
        pipeline = pipeline.with_content_fetcher(ContentFetcher::new(timeout)?);
    }

    let query = args.query.as_deref().unwrap_or(&config.search.query);
    let digest = pipeline.run(query).await?;

    // ---- Output: only a completed run is persisted ----
    let path = pipeline.persist(&digest, &args.output_dir).await?;
    if let Some(json_dir) = &args.json_output_dir {
        if let Err(e) = write_digest_json(&digest, json_dir).await {
            error!(error = %e, "Failed to write JSON digest");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        path = %path.display(),
        stories = digest.stories.len(),
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

async fn load_template(name: &str) -> Result<template::ChatTemplate, DigestError> {
    let loaded = template::load_template(name)
        .await
        .map_err(|e| DigestError::Configuration(format!("cannot load template {name}: {e}")))?;
    info!(template = name, "Loaded template");
    Ok(loaded)
}
