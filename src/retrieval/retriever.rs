//! Nearest-chunk search over a built index

use crate::config::ProjectLayout;
use crate::embedding::Embedder;
use crate::kb::{
    chunks_checksum, read_chunks, ChunkRecord, FlatIndex, IndexManifest, KnowledgeBaseError,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A retrieved chunk, best first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// 1-based position in the result list
    pub rank: usize,
    pub score: f32,
    pub doc_path: String,
    pub chunk_id: usize,
    pub content: String,
}

impl SearchHit {
    /// `<doc_path>#<chunk_id>`
    pub fn citation(&self) -> String {
        format!("{}#{}", self.doc_path, self.chunk_id)
    }
}

/// Loaded index plus the embedder that produced it
pub struct Retriever {
    manifest: IndexManifest,
    index: FlatIndex,
    chunks: Vec<ChunkRecord>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Loads `kb/index`, checking it matches `embedder`
    pub fn open(
        layout: &ProjectLayout,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, KnowledgeBaseError> {
        let index_files = [
            layout.manifest_file(),
            layout.vectors_file(),
            layout.chunks_file(),
        ];
        if index_files.iter().any(|path| !path.exists()) {
            return Err(KnowledgeBaseError::IndexMissing(layout.index_dir()));
        }

        let manifest = IndexManifest::load(&layout.manifest_file())?;
        if manifest.model != embedder.model_id() {
            return Err(KnowledgeBaseError::ModelMismatch {
                index: manifest.model,
                embedder: embedder.model_id().to_string(),
            });
        }

        let index = FlatIndex::load(&layout.vectors_file())?;
        if index.dim() != embedder.dimension() {
            return Err(KnowledgeBaseError::DimensionMismatch {
                expected: index.dim(),
                actual: embedder.dimension(),
            });
        }

        let checksum = chunks_checksum(&layout.chunks_file())?;
        if checksum != manifest.chunks_sha256 {
            return Err(KnowledgeBaseError::Inconsistent(format!(
                "chunks.csv checksum {} does not match manifest {}",
                checksum, manifest.chunks_sha256
            )));
        }

        let chunks = read_chunks(&layout.chunks_file())?;
        if chunks.len() != index.len() {
            return Err(KnowledgeBaseError::Inconsistent(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                index.len()
            )));
        }

        debug!(
            "Opened index: {} vectors, model {}",
            index.len(),
            manifest.model
        );
        Ok(Self {
            manifest,
            index,
            chunks,
            embedder,
        })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The `k` chunks closest to `query`
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, KnowledgeBaseError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(KnowledgeBaseError::EmptyQuery);
        }

        let vector = self.embedder.embed_one(query)?;
        let hits = self
            .index
            .search(&vector, k)?
            .into_iter()
            .enumerate()
            .filter_map(|(i, (position, score))| {
                let chunk = self.chunks.get(position)?;
                Some(SearchHit {
                    rank: i + 1,
                    score,
                    doc_path: chunk.doc_path.clone(),
                    chunk_id: chunk.chunk_id,
                    content: chunk.content.clone(),
                })
            })
            .collect();
        Ok(hits)
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("model", &self.manifest.model)
            .field("vectors", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::kb::{build_index, ChunkingOptions};
    use crate::progress::NoOpHandler;
    use std::fs;
    use tempfile::TempDir;

    fn indexed_project(embedder: &HashingEmbedder) -> (TempDir, ProjectLayout) {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        fs::create_dir_all(layout.facts_dir()).unwrap();
        fs::create_dir_all(layout.categories_dir()).unwrap();
        fs::write(
            layout.facts_dir().join("2021.md"),
            "# Year 2021 overview\n\nTotal income: 50,000.00\nTotal expense: 30,000.00",
        )
        .unwrap();
        fs::write(
            layout.categories_dir().join("Groceries.md"),
            "# Category: Groceries\n\nGroceries spending by month.",
        )
        .unwrap();
        build_index(
            &layout,
            embedder,
            ChunkingOptions::default(),
            4,
            &NoOpHandler,
        )
        .unwrap();
        (dir, layout)
    }

    #[test]
    fn test_search_finds_matching_document() {
        let embedder = HashingEmbedder::new(128);
        let (_dir, layout) = indexed_project(&embedder);
        let retriever = Retriever::open(&layout, Arc::new(embedder)).unwrap();

        assert_eq!(retriever.len(), 2);
        let hits = retriever.search("groceries spending", 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[0].doc_path, "kb/raw/categories/Groceries.md");
        assert_eq!(hits[0].citation(), "kb/raw/categories/Groceries.md#0");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let embedder = HashingEmbedder::new(64);
        let (_dir, layout) = indexed_project(&embedder);
        let retriever = Retriever::open(&layout, Arc::new(embedder)).unwrap();

        assert!(matches!(
            retriever.search("   ", 3),
            Err(KnowledgeBaseError::EmptyQuery)
        ));
    }

    #[test]
    fn test_missing_index() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let result = Retriever::open(&layout, Arc::new(HashingEmbedder::default()));
        assert!(matches!(result, Err(KnowledgeBaseError::IndexMissing(_))));
    }

    #[test]
    fn test_model_mismatch() {
        let (_dir, layout) = indexed_project(&HashingEmbedder::new(64));
        let result = Retriever::open(&layout, Arc::new(HashingEmbedder::new(32)));
        assert!(matches!(
            result,
            Err(KnowledgeBaseError::ModelMismatch { .. })
        ));
    }

    #[test]
    fn test_edited_chunk_table_is_inconsistent() {
        let embedder = HashingEmbedder::new(64);
        let (_dir, layout) = indexed_project(&embedder);

        let mut table = fs::read_to_string(layout.chunks_file()).unwrap();
        table = table.replace("Groceries spending", "Dining spending");
        fs::write(layout.chunks_file(), table).unwrap();

        let result = Retriever::open(&layout, Arc::new(embedder));
        assert!(matches!(result, Err(KnowledgeBaseError::Inconsistent(_))));
    }
}
