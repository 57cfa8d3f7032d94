//! `VectorStore` capability: persist records keyed by id; similarity
//! search; filtered listing; CRUD. Three adapters are specified: an
//! in-process map (default, used for tests), a self-hosted graph-query
//! backend, and a managed namespaced-index backend.

mod in_process;
mod pinecone;
mod weaviate;

pub use in_process::InProcessVectorStore;
pub use pinecone::PineconeVectorStore;
pub use weaviate::WeaviateVectorStore;

use crate::config::{Config, VectorStoreType};
use crate::error::EngineResult;
use crate::record::{Layer, Record};
use async_trait::async_trait;
use std::sync::Arc;

/// Filter applied by `search`/`list`. Adapters that cannot apply a filter
/// server-side MUST apply it client-side and still return up to `k`
/// post-filter matches (over-fetching as needed).
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub layer: Option<Layer>,
    pub tags: Vec<String>,
    pub min_importance: Option<f64>,
}

impl SearchFilter {
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(layer) = self.layer {
            if record.layer != layer {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().all(|t| record.tags.contains(t)) {
            return false;
        }
        if let Some(min) = self.min_importance {
            if record.importance < min {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record: Record,
    pub relevance: f64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn initialize(&self) -> EngineResult<()>;
    async fn store(&self, record: &Record) -> EngineResult<()>;

    async fn store_batch(&self, records: &[Record]) -> EngineResult<()> {
        for chunk in records.chunks(100) {
            for r in chunk {
                self.store(r).await?;
            }
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize, filter: &SearchFilter) -> EngineResult<Vec<SearchHit>>;
    async fn get(&self, id: &str) -> EngineResult<Option<Record>>;
    async fn delete(&self, id: &str) -> EngineResult<bool>;

    async fn delete_batch(&self, ids: &[String]) -> EngineResult<usize> {
        let mut count = 0;
        for id in ids {
            if self.delete(id).await? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Capped at 1,000 per the capability contract.
    async fn list(&self, filter: &SearchFilter) -> EngineResult<Vec<Record>>;
    async fn update(&self, record: &Record) -> EngineResult<()>;
    async fn close(&self) -> EngineResult<()>;
}

/// `embedding_dimensions` is the dimensionality of the configured
/// `EmbeddingProvider` (spec §4.A `dimensions()`); adapters whose emulated
/// `list()` needs a placeholder vector (Pinecone's zero-vector query) must
/// size it to match, since `VECTOR_STORE_TYPE` and `EMBEDDING_PROVIDER`
/// are independently configurable (spec §6).
pub async fn build(config: &Config, embedding_dimensions: usize) -> EngineResult<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match config.vector_store_type {
        VectorStoreType::Memory => Arc::new(InProcessVectorStore::new()),
        VectorStoreType::Weaviate => Arc::new(WeaviateVectorStore::new(
            config.weaviate_url.clone().unwrap_or_default(),
            config.weaviate_api_key.clone(),
        )),
        VectorStoreType::Pinecone => Arc::new(PineconeVectorStore::new(
            config.pinecone_api_key.clone().unwrap_or_default(),
            config.pinecone_index.clone(),
            embedding_dimensions,
        )),
    };
    store.initialize().await?;
    Ok(store)
}

/// Cosine similarity scaled to [0,1], 1 = identical direction. Vectors of
/// mismatched length are treated as maximally dissimilar rather than
/// panicking, since adapters may store records embedded under a
/// previously-configured dimensionality.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < 1e-12 || norm_b < 1e-12 {
        return 0.0;
    }
    let cos = (dot / (norm_a * norm_b)) as f64;
    // cosine is in [-1, 1]; scale to [0, 1].
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_half() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_similarity(&a, &b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn mismatched_length_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }
}
