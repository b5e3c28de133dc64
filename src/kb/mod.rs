//! Knowledge base: markdown documents derived from the ledger, chunked and
//! embedded into a flat vector index
//!
//! Layout under the project root:
//! - `kb/raw/facts/<year>.md` and `kb/raw/categories/<source>.md` from [`materialize`]
//! - any extra `.md`, `.txt` or `.pdf` dropped into `kb/raw` by hand
//! - `kb/index/{chunks.csv,vectors.bin,manifest.json}` from [`build_index`]

pub mod builder;
pub mod chunk;
pub mod documents;
pub mod index;
pub mod materialize;
pub mod summary;

pub use builder::{
    build_index, chunks_checksum, read_chunks, relative_doc_path, ChunkRecord, IndexManifest, IndexReport,
};
pub use chunk::{chunk_text, ChunkingOptions};
pub use documents::{load_documents, normalize_text, Document, DocumentKind};
pub use index::FlatIndex;
pub use materialize::{load_dataset, materialize, safe_file_stem, MaterializeReport};
pub use summary::{
    category_summary, detect_spikes, expense_by_source, format_money, percent_change,
    year_summary, Spike,
};

use crate::embedding::EmbeddingError;
use crate::ledger::LedgerError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the materialize, index and search stages
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("Processed dataset not found: {0} (run the tidy stage first)")]
    DatasetMissing(PathBuf),

    #[error("Vector index not found in {0} (run the index stage first)")]
    IndexMissing(PathBuf),

    #[error("Index was built with model '{index}' but the active embedder is '{embedder}'")]
    ModelMismatch { index: String, embedder: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index is inconsistent: {0}")]
    Inconsistent(String),

    #[error("Query is empty")]
    EmptyQuery,

    #[error("Failed to (de)serialize {path}: {message}")]
    Serialization { path: PathBuf, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

impl KnowledgeBaseError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        KnowledgeBaseError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        KnowledgeBaseError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
