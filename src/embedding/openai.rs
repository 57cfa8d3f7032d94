//! Remote embedding provider: OpenAI-compatible HTTPS API, bearer auth,
//! batched in groups of 100.
//!
//! Grounded on the teacher's `engine/memory/embedding.rs` `EmbeddingClient`:
//! same reqwest JSON-POST idiom, timeout handling, and
//! `format!("... — {}", e)` error-message construction.

use super::{normalize, EmbeddingProvider};
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const BATCH_SIZE: usize = 100;

pub struct OpenAiEmbeddingProvider {
    client: Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingProvider {
    pub fn new(api_key: String, model: String, dimensions: usize) -> Self {
        OpenAiEmbeddingProvider {
            client: Client::new(),
            api_key,
            model,
            dimensions,
        }
    }

    async fn embed_one(&self, text: &str) -> EngineResult<Vec<f32>> {
        let vecs = self.call(std::slice::from_ref(&text.to_string())).await?;
        vecs.into_iter()
            .next()
            .ok_or_else(|| EngineError::backend("embedding", "empty response from embeddings API"))
    }

    async fn call(&self, texts: &[String]) -> EngineResult<Vec<Vec<f32>>> {
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| EngineError::backend("embedding request", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::backend(
                "embedding request",
                format!("OpenAI embed {status} — {text}"),
            ));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| EngineError::backend("embedding response", e))?;

        let data = v["data"]
            .as_array()
            .ok_or_else(|| EngineError::backend("embedding response", "no 'data' array in response"))?;

        let mut out = Vec::with_capacity(data.len());
        for entry in data {
            let arr = entry["embedding"].as_array().ok_or_else(|| {
                EngineError::backend("embedding response", "no 'embedding' array for a data entry")
            })?;
            let mut vec: Vec<f32> = arr.iter().filter_map(|x| x.as_f64().map(|f| f as f32)).collect();
            if vec.is_empty() {
                return Err(EngineError::backend("embedding response", "empty embedding vector"));
            }
            normalize(&mut vec);
            out.push(vec);
        }
        Ok(out)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> EngineResult<Vec<f32>> {
        self.embed_one(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> EngineResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            out.extend(self.call(chunk).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
