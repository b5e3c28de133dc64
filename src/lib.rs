//! finsight - local financial knowledge base and analyst front-end
//!
//! Turns monthly spreadsheet exports into a tidy long-form ledger, writes
//! per-year and per-category markdown summaries, embeds them into a flat
//! vector index and answers questions with a locally served quantized model.
//!
//! # Pipeline
//!
//! 1. **Tidy** ([`ledger`]): `data/raw/*.csv` in wide month-column layout
//!    become `data/tidy/<stem>_tidy.csv` and the merged
//!    `data/processed/all_years_data.csv`.
//! 2. **Materialize** ([`kb::materialize`]): the merged dataset becomes
//!    `kb/raw/facts/<year>.md` and `kb/raw/categories/<name>.md`.
//! 3. **Index** ([`kb::build_index`]): every document under `kb/raw` is
//!    chunked and embedded into `kb/index`.
//!
//! Retrieval ([`retrieval`]) reads the index back, and [`retrieval::Advisor`]
//! sends the retrieved context to the model through [`llm::GenAIClient`].
//!
//! # Example
//!
//! ```no_run
//! use finsight::{FinsightConfig, PipelineContext, PipelineOrchestrator};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = FinsightConfig::from_env()?;
//! config.validate()?;
//!
//! let mut context = PipelineContext::new(config);
//! let report = PipelineOrchestrator::full().execute(&mut context).await?;
//! println!("{} chunks indexed", report.index.map(|i| i.chunks).unwrap_or(0));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod hardware;
pub mod kb;
pub mod ledger;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod retrieval;
pub mod util;

pub use config::{ConfigError, EmbedderKind, FinsightConfig, ProjectLayout};
pub use embedding::{create_embedder, Embedder, EmbeddingError, HashingEmbedder};
pub use kb::KnowledgeBaseError;
pub use ledger::{LedgerError, LedgerRecord};
pub use llm::{BackendError, GenAIClient, LLMClient};
pub use pipeline::{PipelineContext, PipelineOrchestrator, PipelineReport, Stage};
pub use retrieval::{Advisor, Answer, Retriever, SearchHit};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
