//! Configuration management for finsight
//!
//! Settings are loaded from environment variables with sensible defaults and
//! can be overridden by CLI flags. Every on-disk location is derived from the
//! project root through [`ProjectLayout`].
//!
//! # Environment Variables
//!
//! ## Pipeline
//! - `FINSIGHT_ROOT`: Project root - default: "."
//! - `FINSIGHT_EMBEDDER`: Embedding backend (bert|hashing) - default: "bert"
//! - `FINSIGHT_EMBEDDING_MODEL`: HuggingFace repo of the sentence embedder -
//!   default: "sentence-transformers/all-MiniLM-L6-v2"
//! - `FINSIGHT_CHUNK_SIZE`: Maximum characters per chunk - default: "900"
//! - `FINSIGHT_CHUNK_OVERLAP`: Characters shared by consecutive chunks - default: "200"
//! - `FINSIGHT_EMBED_BATCH_SIZE`: Texts per embedding batch - default: "64"
//! - `FINSIGHT_TOP_CATEGORIES`: Category narratives to materialize - default: "30"
//!
//! ## Retrieval and inference
//! - `FINSIGHT_TOP_K`: Chunks retrieved per question - default: "5"
//! - `FINSIGHT_LLM_PROVIDER`: genai adapter used to reach the model - default: "openai"
//! - `FINSIGHT_LLM_MODEL`: Model name served by the runtime - default: "finsight-q4_k_m"
//! - `FINSIGHT_API_BASE_URL`: OpenAI-compatible endpoint - default: "http://localhost:8080/v1/"
//! - `FINSIGHT_REQUEST_TIMEOUT`: Timeout in seconds - default: "120"
//! - `FINSIGHT_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use finsight::FinsightConfig;
//!
//! let config = FinsightConfig::from_env().expect("invalid environment");
//! config.validate().expect("invalid configuration");
//! let layout = config.layout();
//! println!("raw inputs: {}", layout.raw_dir().display());
//! ```

use genai::adapter::AdapterKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ROOT: &str = ".";
const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_CHUNK_SIZE: usize = 900;
const DEFAULT_CHUNK_OVERLAP: usize = 200;
const DEFAULT_EMBED_BATCH_SIZE: usize = 64;
const DEFAULT_TOP_CATEGORIES: usize = 30;
const DEFAULT_TOP_K: usize = 5;
const DEFAULT_LLM_PROVIDER: &str = "openai";
const DEFAULT_LLM_MODEL: &str = "finsight-q4_k_m";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/v1/";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid LLM provider name
    #[error("Invalid provider: {0}. Valid options: openai, ollama, anthropic, gemini, xai, groq")]
    InvalidProvider(String),

    /// Invalid embedder name
    #[error("Invalid embedder: {0}. Valid options: bert, hashing")]
    InvalidEmbedder(String),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Which embedding backend vectorises knowledge-base chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Sentence-transformers BERT model executed with candle
    Bert,
    /// Deterministic feature-hashing embedder, no download required
    Hashing,
}

impl FromStr for EmbedderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bert" => Ok(EmbedderKind::Bert),
            "hashing" | "hash" => Ok(EmbedderKind::Hashing),
            other => Err(ConfigError::InvalidEmbedder(other.to_string())),
        }
    }
}

impl fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedderKind::Bert => write!(f, "bert"),
            EmbedderKind::Hashing => write!(f, "hashing"),
        }
    }
}

/// Main configuration structure for finsight
#[derive(Debug, Clone)]
pub struct FinsightConfig {
    /// Project root holding `data/` and `kb/`
    pub root: PathBuf,

    /// Embedding backend
    pub embedder: EmbedderKind,

    /// HuggingFace repository of the sentence embedding model
    pub embedding_model: String,

    /// Maximum characters per knowledge-base chunk
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Number of texts embedded per batch
    pub embed_batch_size: usize,

    /// Number of expense categories that get a narrative document
    pub top_categories: usize,

    /// Chunks retrieved per search or question
    pub top_k: usize,

    /// genai adapter used to talk to the inference runtime
    pub llm_provider: AdapterKind,

    /// Model name as served by the runtime
    pub llm_model: String,

    /// Base URL of the OpenAI-compatible endpoint
    pub api_base_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for FinsightConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            embedder: EmbedderKind::Bert,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            top_categories: DEFAULT_TOP_CATEGORIES,
            top_k: DEFAULT_TOP_K,
            llm_provider: AdapterKind::OpenAI,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

fn env_parsed<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            field: name.to_string(),
            error: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parses a genai adapter name, accepting a few common aliases
pub fn parse_provider(s: &str) -> Result<AdapterKind, ConfigError> {
    let lower = s.trim().to_lowercase();
    let normalized = match lower.as_str() {
        "claude" => "anthropic",
        "grok" => "xai",
        "llamacpp" | "llama.cpp" | "llama-server" => "openai",
        other => other,
    };
    AdapterKind::from_lower_str(normalized).ok_or(ConfigError::InvalidProvider(lower))
}

impl FinsightConfig {
    /// Loads configuration from `FINSIGHT_*` environment variables
    ///
    /// Unset variables fall back to defaults; set but unparsable variables are
    /// reported instead of silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let root = env::var("FINSIGHT_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.root);

        let embedder = match env::var("FINSIGHT_EMBEDDER") {
            Ok(raw) => raw.parse::<EmbedderKind>()?,
            Err(_) => defaults.embedder,
        };

        let llm_provider = match env::var("FINSIGHT_LLM_PROVIDER") {
            Ok(raw) => parse_provider(&raw)?,
            Err(_) => parse_provider(DEFAULT_LLM_PROVIDER)?,
        };

        Ok(Self {
            root,
            embedder,
            embedding_model: env::var("FINSIGHT_EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            chunk_size: env_parsed("FINSIGHT_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: env_parsed("FINSIGHT_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            embed_batch_size: env_parsed("FINSIGHT_EMBED_BATCH_SIZE", defaults.embed_batch_size)?,
            top_categories: env_parsed("FINSIGHT_TOP_CATEGORIES", defaults.top_categories)?,
            top_k: env_parsed("FINSIGHT_TOP_K", defaults.top_k)?,
            llm_provider,
            llm_model: env::var("FINSIGHT_LLM_MODEL").unwrap_or(defaults.llm_model),
            api_base_url: env::var("FINSIGHT_API_BASE_URL").unwrap_or(defaults.api_base_url),
            request_timeout_secs: env_parsed(
                "FINSIGHT_REQUEST_TIMEOUT",
                defaults.request_timeout_secs,
            )?,
            log_level: env::var("FINSIGHT_LOG_LEVEL")
                .unwrap_or(defaults.log_level)
                .to_lowercase(),
        })
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=100_000).contains(&self.chunk_size) {
            return Err(ConfigError::ValidationFailed(format!(
                "Chunk size must be between 100 and 100000 characters (got {})",
                self.chunk_size
            )));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::ValidationFailed(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embed_batch_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "Embedding batch size must be at least 1".to_string(),
            ));
        }
        if self.top_categories == 0 {
            return Err(ConfigError::ValidationFailed(
                "At least one category narrative must be materialized".to_string(),
            ));
        }
        if !(1..=100).contains(&self.top_k) {
            return Err(ConfigError::ValidationFailed(format!(
                "top-k must be between 1 and 100 (got {})",
                self.top_k
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "API base URL must not be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Paths derived from the configured root
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(&self.root)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Key/value view used by `--format` output and debug logging
    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("root".to_string(), self.root.display().to_string());
        map.insert("embedder".to_string(), self.embedder.to_string());
        map.insert("embedding_model".to_string(), self.embedding_model.clone());
        map.insert("chunk_size".to_string(), self.chunk_size.to_string());
        map.insert("chunk_overlap".to_string(), self.chunk_overlap.to_string());
        map.insert(
            "embed_batch_size".to_string(),
            self.embed_batch_size.to_string(),
        );
        map.insert("top_categories".to_string(), self.top_categories.to_string());
        map.insert("top_k".to_string(), self.top_k.to_string());
        map.insert(
            "llm_provider".to_string(),
            self.llm_provider.as_str().to_string(),
        );
        map.insert("llm_model".to_string(), self.llm_model.clone());
        map.insert("api_base_url".to_string(), self.api_base_url.clone());
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());
        map
    }
}

impl fmt::Display for FinsightConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Finsight Configuration:")?;
        for (key, value) in self.to_display_map() {
            writeln!(f, "  {}: {}", key, value)?;
        }
        Ok(())
    }
}

/// On-disk layout of a finsight project
///
/// ```text
/// <root>/data/raw/*.csv                          raw wide exports
/// <root>/data/tidy/<stem>_tidy.csv               tidy long-form records
/// <root>/data/processed/all_years_data.csv       merged dataset
/// <root>/kb/raw/{facts,categories}/*.md          materialized documents
/// <root>/kb/index/{chunks.csv,vectors.bin,manifest.json}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("data").join("raw")
    }

    pub fn tidy_dir(&self) -> PathBuf {
        self.root.join("data").join("tidy")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("data").join("processed")
    }

    pub fn dataset_file(&self) -> PathBuf {
        self.processed_dir().join("all_years_data.csv")
    }

    pub fn kb_raw_dir(&self) -> PathBuf {
        self.root.join("kb").join("raw")
    }

    pub fn facts_dir(&self) -> PathBuf {
        self.kb_raw_dir().join("facts")
    }

    pub fn categories_dir(&self) -> PathBuf {
        self.kb_raw_dir().join("categories")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join("kb").join("index")
    }

    pub fn chunks_file(&self) -> PathBuf {
        self.index_dir().join("chunks.csv")
    }

    pub fn vectors_file(&self) -> PathBuf {
        self.index_dir().join("vectors.bin")
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.index_dir().join("manifest.json")
    }
}
