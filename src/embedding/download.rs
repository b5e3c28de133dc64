//! Sentence-transformer downloads from HuggingFace Hub

use super::EmbeddingError;
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::PathBuf;
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Local paths of the files a BERT sentence model needs
#[derive(Debug, Clone)]
pub struct SentenceModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// Downloads and caches sentence-transformer models
pub struct ModelDownloader {
    api: Api,
    cache_dir: PathBuf,
}

impl ModelDownloader {
    /// Creates a downloader using the default HuggingFace cache
    pub fn new() -> Result<Self, EmbeddingError> {
        let api = Api::new().map_err(|e| EmbeddingError::Download {
            repo: "huggingface.co".to_string(),
            file: String::new(),
            message: format!("failed to initialize HuggingFace Hub API: {}", e),
        })?;

        let cache_dir = dirs::cache_dir()
            .map(|d| d.join("huggingface").join("hub"))
            .unwrap_or_else(|| PathBuf::from(".cache/huggingface/hub"));

        debug!("HuggingFace cache directory: {}", cache_dir.display());

        Ok(Self { api, cache_dir })
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    /// Fetches config, tokenizer and weights, reusing cached copies
    pub fn fetch(&self, repo_id: &str) -> Result<SentenceModelFiles, EmbeddingError> {
        if self.is_downloaded(repo_id) {
            debug!("Embedding model {} found in cache", repo_id);
        } else {
            info!("Downloading embedding model {}...", repo_id);
        }

        let files = SentenceModelFiles {
            config: self.get(repo_id, CONFIG_FILE)?,
            tokenizer: self.get(repo_id, TOKENIZER_FILE)?,
            weights: self.get(repo_id, WEIGHTS_FILE)?,
        };

        debug!("Embedding model files: {:?}", files);
        Ok(files)
    }

    /// Whether every model file is present in the local cache
    pub fn is_downloaded(&self, repo_id: &str) -> bool {
        let cache = hf_hub::Cache::new(self.cache_dir.clone());
        let repo = cache.repo(Repo::new(repo_id.to_string(), RepoType::Model));
        [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE]
            .iter()
            .all(|file| repo.get(file).is_some_and(|path| path.exists()))
    }

    fn get(&self, repo_id: &str, file: &str) -> Result<PathBuf, EmbeddingError> {
        self.api
            .repo(Repo::new(repo_id.to_string(), RepoType::Model))
            .get(file)
            .map_err(|e| EmbeddingError::Download {
                repo: repo_id.to_string(),
                file: file.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloader_creation() {
        let downloader = ModelDownloader::new().unwrap();
        assert!(!downloader.cache_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_unknown_repo_is_not_cached() {
        let downloader = ModelDownloader::new().unwrap();
        assert!(!downloader.is_downloaded("finsight-test/does-not-exist"));
    }
}
