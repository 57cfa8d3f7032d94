//! Local embedding provider: deterministic hashing TF-IDF over a running
//! vocabulary, 512 dimensions (spec §4.A).
//!
//! Vocabulary and inverse-document-frequency table are updated on every
//! `embed` call. No teacher file does this directly — the teacher always
//! calls out to Ollama/OpenAI — so this is built from the spec's formula
//! in the teacher's module-doc-and-inline-test style.

use super::{normalize, EmbeddingProvider};
use crate::error::EngineResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

struct Vocabulary {
    /// Number of documents embedded so far.
    doc_count: u64,
    /// Per-token document frequency.
    doc_freq: HashMap<String, u64>,
}

pub struct LocalEmbeddingProvider {
    dimensions: usize,
    vocab: Mutex<Vocabulary>,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn bucket(token: &str, dimensions: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimensions
}

impl LocalEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        LocalEmbeddingProvider {
            dimensions,
            vocab: Mutex::new(Vocabulary {
                doc_count: 0,
                doc_freq: HashMap::new(),
            }),
        }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let n_tokens = tokens.len().max(1) as f64;

        let mut term_freq: HashMap<&str, u64> = HashMap::new();
        for t in &tokens {
            *term_freq.entry(t.as_str()).or_insert(0) += 1;
        }

        let mut vocab = self.vocab.lock();
        vocab.doc_count += 1;
        for token in term_freq.keys() {
            *vocab.doc_freq.entry((*token).to_string()).or_insert(0) += 1;
        }
        let n = vocab.doc_count as f64;

        let mut v = vec![0f32; self.dimensions];
        for (token, tf) in &term_freq {
            let df = *vocab.doc_freq.get(*token).unwrap_or(&1) as f64;
            let idf = ((n + 1.0) / (df + 1.0)).ln() + 1.0;
            let weight = ((*tf as f64) / n_tokens) * idf;
            let idx = bucket(token, self.dimensions);
            v[idx] += weight as f32;
        }

        normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> EngineResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedding_is_unit_norm() {
        let provider = LocalEmbeddingProvider::new(512);
        let v = provider.embed("the quick brown fox jumps").await.unwrap();
        assert_eq!(v.len(), 512);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5 || norm == 0.0);
    }

    #[tokio::test]
    async fn repeated_terms_shift_idf_over_calls() {
        let provider = LocalEmbeddingProvider::new(512);
        let first = provider.embed("alpha beta").await.unwrap();
        let second = provider.embed("alpha beta").await.unwrap();
        // Same tokens, but idf has shifted because doc_count advanced between calls.
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn empty_text_does_not_panic() {
        let provider = LocalEmbeddingProvider::new(512);
        let v = provider.embed("   ").await.unwrap();
        assert_eq!(v.len(), 512);
    }
}
