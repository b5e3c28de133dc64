//! Exact inner-product vector index
//!
//! Vectors are stored row-major in a single buffer. With L2-normalised
//! embeddings the inner product is the cosine similarity.

use super::KnowledgeBaseError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Brute-force index over fixed-dimension vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends vectors; every vector must match the index dimension
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), KnowledgeBaseError> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(KnowledgeBaseError::DimensionMismatch {
                expected: self.dim,
                actual: bad.len(),
            });
        }
        self.data.reserve(vectors.len() * self.dim);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Vector stored at `position`
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    /// The `k` best `(position, score)` pairs, highest score first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, KnowledgeBaseError> {
        if query.len() != self.dim {
            return Err(KnowledgeBaseError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        if k == 0 || self.dim == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(pos, row)| (pos, dot(row, query)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn save(&self, path: &Path) -> Result<(), KnowledgeBaseError> {
        let file = File::create(path).map_err(|e| KnowledgeBaseError::io(path, e))?;
        bincode::serialize_into(BufWriter::new(file), self).map_err(|e| {
            KnowledgeBaseError::Serialization {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })
    }

    pub fn load(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let file = File::open(path).map_err(|e| KnowledgeBaseError::io(path, e))?;
        let index: FlatIndex = bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
            KnowledgeBaseError::Serialization {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        if index.dim > 0 && index.data.len() % index.dim != 0 {
            return Err(KnowledgeBaseError::Serialization {
                path: path.to_path_buf(),
                message: format!(
                    "{} values do not form rows of dimension {}",
                    index.data.len(),
                    index.dim
                ),
            });
        }
        Ok(index)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unit(v: &[f32]) -> Vec<f32> {
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }

    fn sample() -> FlatIndex {
        let mut index = FlatIndex::new(3);
        index
            .add(&[
                unit(&[1.0, 0.0, 0.0]),
                unit(&[0.0, 1.0, 0.0]),
                unit(&[1.0, 1.0, 0.0]),
                unit(&[0.0, 0.0, 1.0]),
            ])
            .unwrap();
        index
    }

    #[test]
    fn test_add_and_len() {
        let index = sample();
        assert_eq!(index.len(), 4);
        assert_eq!(index.dim(), 3);
        assert_eq!(index.vector(3), Some(&[0.0, 0.0, 1.0][..]));
        assert!(index.vector(4).is_none());
    }

    #[test]
    fn test_add_rejects_wrong_dimension() {
        let mut index = FlatIndex::new(3);
        let err = index.add(&[vec![1.0, 0.0]]).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_search_ranks_by_inner_product() {
        let index = sample();
        let hits = index.search(&unit(&[1.0, 0.2, 0.0]), 3).unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1].0, 2);
        assert_eq!(hits[2].0, 1);
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn test_identical_vector_scores_one() {
        let index = sample();
        let hits = index.search(&unit(&[1.0, 1.0, 0.0]), 1).unwrap();
        assert_eq!(hits[0].0, 2);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_with_wrong_query_dimension() {
        assert!(sample().search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.bin");
        let index = sample();

        index.save(&path).unwrap();
        assert_eq!(FlatIndex::load(&path).unwrap(), index);
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.bin");
        std::fs::write(&path, b"nope").unwrap();
        assert!(FlatIndex::load(&path).is_err());
    }
}
