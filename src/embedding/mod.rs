//! Sentence embeddings for knowledge-base chunks and queries
//!
//! Two backends implement [`Embedder`]:
//! - [`BertEmbedder`]: a sentence-transformers BERT model (MiniLM by default)
//!   downloaded from HuggingFace and executed locally with Candle
//! - [`HashingEmbedder`]: deterministic signed feature hashing, for tests and
//!   machines without network access
//!
//! Both return L2-normalised vectors, so inner product equals cosine similarity.

mod bert;
mod download;
mod hashing;

pub use bert::BertEmbedder;
pub use download::{ModelDownloader, SentenceModelFiles};
pub use hashing::HashingEmbedder;

use crate::config::{EmbedderKind, FinsightConfig};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading or running an embedding model
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Failed to download {file} from {repo}: {message}")]
    Download {
        repo: String,
        file: String,
        message: String,
    },

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(#[from] candle_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns text into fixed-size, L2-normalised vectors
pub trait Embedder: Send + Sync {
    /// Identifier recorded in the index manifest
    fn model_id(&self) -> &str;

    /// Length of every returned vector
    fn dimension(&self) -> usize;

    /// Embeds a batch of texts, one vector per text in input order
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidConfig("embedder returned no vector".to_string()))
    }
}

/// Scales a vector to unit length; zero vectors are left untouched
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Builds the embedder selected by the configuration
///
/// The BERT backend downloads its files on first use.
pub fn create_embedder(config: &FinsightConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.embedder {
        EmbedderKind::Bert => Ok(Arc::new(BertEmbedder::load(&config.embedding_model)?)),
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_create_hashing_embedder() {
        let config = FinsightConfig {
            embedder: EmbedderKind::Hashing,
            ..Default::default()
        };
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.model_id(), "hashing-384");
        assert_eq!(embedder.embed_one("rent").unwrap().len(), 384);
    }
}
