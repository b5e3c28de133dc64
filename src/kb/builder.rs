//! Chunks the knowledge base, embeds every chunk and writes the index files

use super::chunk::{chunk_text, ChunkingOptions};
use super::documents::load_documents;
use super::index::FlatIndex;
use super::KnowledgeBaseError;
use crate::config::ProjectLayout;
use crate::embedding::Embedder;
use crate::progress::{ProgressEvent, ProgressHandler};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One row of `chunks.csv`; row order matches index positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub doc_path: String,
    pub chunk_id: usize,
    pub content: String,
    pub model: String,
}

/// Metadata written next to the vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub model: String,
    pub dimension: usize,
    pub chunks: usize,
    pub documents: usize,
    pub built_at: DateTime<Utc>,
    pub chunks_sha256: String,
}

impl IndexManifest {
    pub fn load(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let text = fs::read_to_string(path).map_err(|e| KnowledgeBaseError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| KnowledgeBaseError::Serialization {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn save(&self, path: &Path) -> Result<(), KnowledgeBaseError> {
        let text =
            serde_json::to_string_pretty(self).map_err(|e| KnowledgeBaseError::Serialization {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        fs::write(path, text).map_err(|e| KnowledgeBaseError::io(path, e))
    }
}

/// Summary of an index build
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub model: String,
    pub dimension: usize,
    pub documents: usize,
    pub chunks: usize,
    pub index_dir: PathBuf,
}

/// Path of `path` relative to `root`, with `/` separators
pub fn relative_doc_path(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return path.to_string_lossy().replace('\\', "/");
    };
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_chunks(path: &Path, chunks: &[ChunkRecord]) -> Result<String, KnowledgeBaseError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for chunk in chunks {
        writer
            .serialize(chunk)
            .map_err(|e| KnowledgeBaseError::csv(path, e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| KnowledgeBaseError::io(path, e.into_error()))?;
    fs::write(path, &bytes).map_err(|e| KnowledgeBaseError::io(path, e))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Hex SHA-256 of the chunk table as it is on disk
pub fn chunks_checksum(path: &Path) -> Result<String, KnowledgeBaseError> {
    let bytes = fs::read(path).map_err(|e| KnowledgeBaseError::io(path, e))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Reads `chunks.csv` back in index order
pub fn read_chunks(path: &Path) -> Result<Vec<ChunkRecord>, KnowledgeBaseError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| KnowledgeBaseError::csv(path, e))?;
    reader
        .deserialize()
        .map(|row| row.map_err(|e| KnowledgeBaseError::csv(path, e)))
        .collect()
}

fn embedding_bar(total: usize) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks",
    ) {
        bar.set_style(style.progress_chars("█▓░"));
    }
    bar
}

/// Builds `kb/index` from every document under `kb/raw`
///
/// Without documents nothing is written and an empty report is returned.
pub fn build_index(
    layout: &ProjectLayout,
    embedder: &dyn Embedder,
    options: ChunkingOptions,
    batch_size: usize,
    progress: &dyn ProgressHandler,
) -> Result<IndexReport, KnowledgeBaseError> {
    let index_dir = layout.index_dir();
    fs::create_dir_all(&index_dir).map_err(|e| KnowledgeBaseError::io(&index_dir, e))?;

    let mut report = IndexReport {
        model: embedder.model_id().to_string(),
        dimension: embedder.dimension(),
        index_dir: index_dir.clone(),
        ..Default::default()
    };

    let documents = load_documents(&layout.kb_raw_dir())?;
    if documents.is_empty() {
        warn!(
            "No documents found in {}; index not built",
            layout.kb_raw_dir().display()
        );
        return Ok(report);
    }

    let mut chunks = Vec::new();
    for document in &documents {
        let doc_path = relative_doc_path(layout.root(), &document.path);
        let pieces = chunk_text(&document.text, options);
        debug!("{}: {} chunks", doc_path, pieces.len());
        for (chunk_id, content) in pieces.into_iter().enumerate() {
            chunks.push(ChunkRecord {
                doc_path: doc_path.clone(),
                chunk_id,
                content,
                model: report.model.clone(),
            });
        }
    }

    info!(
        "Embedding {} chunks from {} documents with {}",
        chunks.len(),
        documents.len(),
        report.model
    );

    let mut index = FlatIndex::new(embedder.dimension());
    let bar = embedding_bar(chunks.len());
    let mut done = 0;
    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed(&texts)?;
        if vectors.len() != texts.len() {
            return Err(KnowledgeBaseError::Inconsistent(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        index.add(&vectors)?;

        done += batch.len();
        bar.set_position(done as u64);
        progress.on_progress(&ProgressEvent::EmbeddingBatch {
            done,
            total: chunks.len(),
        });
    }
    bar.finish_and_clear();

    index.save(&layout.vectors_file())?;
    let chunks_sha256 = write_chunks(&layout.chunks_file(), &chunks)?;

    let manifest = IndexManifest {
        model: report.model.clone(),
        dimension: index.dim(),
        chunks: chunks.len(),
        documents: documents.len(),
        built_at: Utc::now(),
        chunks_sha256,
    };
    manifest.save(&layout.manifest_file())?;

    report.documents = documents.len();
    report.chunks = chunks.len();
    info!(
        "Index written to {} ({} vectors, dim {})",
        index_dir.display(),
        index.len(),
        index.dim()
    );
    Ok(report)
}
