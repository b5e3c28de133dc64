//! Command handlers
//!
//! Each handler resolves the effective configuration, runs its command and
//! returns the process exit code. Errors are reported on stderr here so that
//! `main` only has to exit.

use super::commands::{
    AskArgs, ConfigArgs, DoctorArgs, EmbedderArgs, HealthArgs, SearchArgs, StageArgs,
};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::FinsightConfig;
use crate::embedding::{create_embedder, Embedder};
use crate::hardware::{probe, HardwareDetector, RequirementReport};
use crate::llm::GenAIClient;
use crate::pipeline::{PipelineContext, PipelineOrchestrator, Stage};
use crate::progress::LoggingHandler;
use crate::retrieval::{Advisor, Retriever};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

fn report_error(err: &anyhow::Error) -> i32 {
    error!("{:#}", err);
    eprintln!("Error: {:#}", err);
    1
}

fn print_output(output: &str) {
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
}

fn apply_embedder_args(config: &mut FinsightConfig, args: &EmbedderArgs) {
    if let Some(kind) = args.embedder {
        config.embedder = kind;
    }
    if let Some(ref model) = args.embedding_model {
        config.embedding_model = model.clone();
    }
}

fn apply_root(config: &mut FinsightConfig, root: Option<&Path>) {
    if let Some(root) = root {
        config.root = root.to_path_buf();
    }
}

/// Loads the environment, applies `overrides` and validates the result
fn load_config(overrides: impl FnOnce(&mut FinsightConfig)) -> Result<FinsightConfig> {
    let mut config = FinsightConfig::from_env().context("Failed to load configuration")?;
    overrides(&mut config);
    config.validate().context("Invalid configuration")?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

async fn load_embedder(config: &FinsightConfig) -> Result<Arc<dyn Embedder>> {
    let config = config.clone();
    let kind = config.embedder;
    tokio::task::spawn_blocking(move || create_embedder(&config))
        .await
        .context("Embedder loading task failed")?
        .with_context(|| format!("Failed to load {} embedder", kind))
}

async fn open_retriever(config: &FinsightConfig) -> Result<Retriever> {
    let embedder = load_embedder(config).await?;
    let layout = config.layout();
    Retriever::open(&layout, embedder).context("Failed to open the knowledge-base index")
}

/// Runs `stages` over the configured project root
pub async fn handle_stages(stages: &[Stage], args: &StageArgs, quiet: bool) -> i32 {
    match run_stages(stages, args, quiet).await {
        Ok(code) => code,
        Err(e) => report_error(&e),
    }
}

async fn run_stages(stages: &[Stage], args: &StageArgs, quiet: bool) -> Result<i32> {
    let config = load_config(|config| {
        apply_root(config, args.root.as_deref());
        apply_embedder_args(config, &args.embedding);
        if let Some(batch_size) = args.batch_size {
            config.embed_batch_size = batch_size;
        }
        if let Some(top_categories) = args.top_categories {
            config.top_categories = top_categories;
        }
    })?;

    let mut context = PipelineContext::new(config).with_progress(Arc::new(LoggingHandler));
    let report = PipelineOrchestrator::new(stages.to_vec())
        .execute(&mut context)
        .await?;

    let format: OutputFormat = args.format.into();
    if !quiet || format != OutputFormat::Human {
        print_output(&OutputFormatter::new(format).format_pipeline(&report)?);
    }
    Ok(0)
}

pub async fn handle_search(args: &SearchArgs) -> i32 {
    match run_search(args).await {
        Ok(code) => code,
        Err(e) => report_error(&e),
    }
}

async fn run_search(args: &SearchArgs) -> Result<i32> {
    let config = load_config(|config| {
        apply_root(config, args.root.as_deref());
        apply_embedder_args(config, &args.embedding);
        if let Some(k) = args.top_k {
            config.top_k = k;
        }
    })?;

    let retriever = open_retriever(&config).await?;
    let hits = retriever.search(&args.query, config.top_k)?;
    info!("Found {} chunks for query", hits.len());

    let formatter = OutputFormatter::new(args.format.into());
    print_output(&formatter.format_search(&args.query, &hits)?);
    Ok(0)
}

pub async fn handle_ask(args: &AskArgs) -> i32 {
    match run_ask(args).await {
        Ok(code) => code,
        Err(e) => report_error(&e),
    }
}

async fn run_ask(args: &AskArgs) -> Result<i32> {
    let config = load_config(|config| {
        apply_root(config, args.root.as_deref());
        apply_embedder_args(config, &args.embedding);
        if let Some(k) = args.top_k {
            config.top_k = k;
        }
        if let Some(ref model) = args.model {
            config.llm_model = model.clone();
        }
        if let Some(provider) = args.provider {
            config.llm_provider = provider;
        }
        if let Some(ref api_base) = args.api_base {
            config.api_base_url = api_base.clone();
        }
        if let Some(timeout) = args.timeout {
            config.request_timeout_secs = timeout;
        }
    })?;

    let retriever = open_retriever(&config).await?;
    let client = GenAIClient::from_config(&config).context("Failed to create LLM client")?;
    info!("Asking {} at {}", config.llm_model, config.api_base_url);

    let advisor = Advisor::new(retriever, Arc::new(client));
    let answer = advisor.ask(&args.question, config.top_k).await?;

    let formatter = OutputFormatter::new(args.format.into());
    print_output(&formatter.format_answer(&answer)?);
    Ok(0)
}

/// Exits with 1 when any hard requirement fails
pub async fn handle_doctor(args: &DoctorArgs) -> i32 {
    match run_doctor(args).await {
        Ok(code) => code,
        Err(e) => report_error(&e),
    }
}

/// Directory whose disk is checked: `ROOT`, else the configured root
fn doctor_root(root: Option<&Path>) -> Result<PathBuf> {
    let mut config = FinsightConfig::from_env().context("Failed to load configuration")?;
    apply_root(&mut config, root);
    Ok(config.root)
}

async fn run_doctor(args: &DoctorArgs) -> Result<i32> {
    let path = doctor_root(args.root.as_deref())?;

    let capabilities = tokio::task::spawn_blocking(move || HardwareDetector::detect_at(&path))
        .await
        .context("Hardware detection task failed")?;
    let report = RequirementReport::evaluate(capabilities);

    let formatter = OutputFormatter::new(args.format.into());
    print_output(&formatter.format_requirements(&report)?);
    Ok(if report.meets_minimum() { 0 } else { 1 })
}

/// Exits with 1 when the endpoint is unreachable or unhealthy
pub async fn handle_health(args: &HealthArgs) -> i32 {
    match run_health(args).await {
        Ok(code) => code,
        Err(e) => report_error(&e),
    }
}

async fn run_health(args: &HealthArgs) -> Result<i32> {
    let config = load_config(|config| {
        if let Some(ref api_base) = args.api_base {
            config.api_base_url = api_base.clone();
        }
    })?;
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(5));

    let report = probe(&config.api_base_url, timeout).await;
    let formatter = OutputFormatter::new(args.format.into());
    print_output(&formatter.format_health(&report)?);
    Ok(if report.is_healthy() { 0 } else { 1 })
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let result = load_config(|_| {}).and_then(|config| {
        OutputFormatter::new(args.format.into()).format_config(&config)
    });
    match result {
        Ok(output) => {
            print_output(&output);
            0
        }
        Err(e) => report_error(&e),
    }
}
