//! Environment-driven configuration, loaded once at process start.
//!
//! `Config::from_env` is the single factory input used to construct the
//! concrete `EmbeddingProvider` and `VectorStore` implementations (see
//! `embedding::build` and `vector_store::build`) — picked once at startup,
//! no runtime reflection.

use crate::error::{EngineError, EngineResult};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorStoreType {
    Memory,
    Weaviate,
    Pinecone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderType {
    OpenAi,
    Local,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub vector_store_type: VectorStoreType,
    pub embedding_provider_type: EmbeddingProviderType,

    pub working_memory_ttl_ms: i64,
    pub short_term_memory_ttl_ms: i64,
    pub long_term_memory_ttl_ms: i64,

    pub consolidation_threshold: usize,
    pub consolidation_age_ms: i64,

    pub decay_rate: f64,
    pub decay_interval_ms: u64,

    pub openai_api_key: Option<String>,
    pub openai_embedding_model: String,
    pub openai_embedding_dimensions: usize,

    pub weaviate_url: Option<String>,
    pub weaviate_api_key: Option<String>,

    pub pinecone_api_key: Option<String>,
    pub pinecone_index: String,
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> EngineResult<T> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| EngineError::fatal_init(format!("{name} is not a valid value: {v}"))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> EngineResult<Self> {
        let vector_store_type = match env_or("VECTOR_STORE_TYPE", "memory").as_str() {
            "memory" => VectorStoreType::Memory,
            "weaviate" => VectorStoreType::Weaviate,
            "pinecone" => VectorStoreType::Pinecone,
            other => {
                return Err(EngineError::fatal_init(format!(
                    "unrecognized VECTOR_STORE_TYPE: {other}"
                )))
            }
        };

        let embedding_provider_type = match env_or("EMBEDDING_PROVIDER", "openai").as_str() {
            "openai" => EmbeddingProviderType::OpenAi,
            "local" => EmbeddingProviderType::Local,
            other => {
                return Err(EngineError::fatal_init(format!(
                    "unrecognized EMBEDDING_PROVIDER: {other}"
                )))
            }
        };

        let openai_api_key = env::var("OPENAI_API_KEY").ok();
        if embedding_provider_type == EmbeddingProviderType::OpenAi && openai_api_key.is_none() {
            return Err(EngineError::fatal_init(
                "OPENAI_API_KEY is required when EMBEDDING_PROVIDER=openai",
            ));
        }

        let pinecone_api_key = env::var("PINECONE_API_KEY").ok();
        if vector_store_type == VectorStoreType::Pinecone && pinecone_api_key.is_none() {
            return Err(EngineError::fatal_init(
                "PINECONE_API_KEY is required when VECTOR_STORE_TYPE=pinecone",
            ));
        }

        let weaviate_url = env::var("WEAVIATE_URL").ok();
        if vector_store_type == VectorStoreType::Weaviate && weaviate_url.is_none() {
            return Err(EngineError::fatal_init(
                "WEAVIATE_URL is required when VECTOR_STORE_TYPE=weaviate",
            ));
        }

        Ok(Config {
            vector_store_type,
            embedding_provider_type,
            working_memory_ttl_ms: env_parse("WORKING_MEMORY_TTL", 1_800_000)?,
            short_term_memory_ttl_ms: env_parse("SHORT_TERM_MEMORY_TTL", 604_800_000)?,
            long_term_memory_ttl_ms: env_parse("LONG_TERM_MEMORY_TTL", 31_536_000_000)?,
            consolidation_threshold: env_parse("CONSOLIDATION_THRESHOLD", 100)?,
            consolidation_age_ms: env_parse("CONSOLIDATION_AGE", 2_592_000_000)?,
            decay_rate: env_parse("DECAY_RATE", 0.1)?,
            decay_interval_ms: env_parse("DECAY_INTERVAL", 86_400_000)?,
            openai_api_key,
            openai_embedding_model: env_or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
            openai_embedding_dimensions: env_parse("OPENAI_EMBEDDING_DIMENSIONS", 1536)?,
            weaviate_url,
            weaviate_api_key: env::var("WEAVIATE_API_KEY").ok(),
            pinecone_api_key,
            pinecone_index: env_or("PINECONE_INDEX", "memory-mcp"),
        })
    }

    /// TTL for a given layer, per the env-var table in §6.
    pub fn ttl_for(&self, layer: crate::record::Layer) -> i64 {
        match layer {
            crate::record::Layer::Working => self.working_memory_ttl_ms,
            crate::record::Layer::ShortTerm => self.short_term_memory_ttl_ms,
            crate::record::Layer::LongTerm => self.long_term_memory_ttl_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_to_default() {
        // SAFETY: no other test in this process reads this exact key.
        env::remove_var("__MEMORYD_TEST_UNSET__");
        let v: i64 = env_parse("__MEMORYD_TEST_UNSET__", 42).unwrap();
        assert_eq!(v, 42);
    }
}
