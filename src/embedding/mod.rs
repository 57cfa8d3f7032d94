//! `EmbeddingProvider` capability: text → fixed-dimension unit-length vector.
//!
//! The engine must not depend on which variant is active beyond this
//! contract. Picked once at startup by [`build`], keyed on `Config`.

mod local;
mod openai;

pub use local::LocalEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;

use crate::config::{Config, EmbeddingProviderType};
use crate::error::EngineResult;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> EngineResult<Vec<f32>>;

    /// Default batches one at a time; remote providers override this to
    /// batch in groups of 100 per the capability contract.
    async fn embed_batch(&self, texts: &[String]) -> EngineResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize;
}

pub fn build(config: &Config) -> EngineResult<Arc<dyn EmbeddingProvider>> {
    match config.embedding_provider_type {
        EmbeddingProviderType::OpenAi => Ok(Arc::new(OpenAiEmbeddingProvider::new(
            config.openai_api_key.clone().unwrap_or_default(),
            config.openai_embedding_model.clone(),
            config.openai_embedding_dimensions,
        ))),
        EmbeddingProviderType::Local => Ok(Arc::new(LocalEmbeddingProvider::new(512))),
    }
}

/// L2-normalize a vector in place; no-op on a zero vector.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
