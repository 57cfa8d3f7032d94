//! Line-delimited JSON-RPC transport over stdio.
//!
//! Deliberate divergence from the teacher's `engine/mcp/transport.rs`: that
//! module frames messages with `Content-Length` headers (LSP-style)
//! because it spawns a child MCP server and speaks to it as a *client*.
//! This crate is the *server* side of its own process's stdio and spec.md
//! §1 is explicit that the wire format here is line-delimited JSON-RPC —
//! one JSON object per line, no framing headers. The reader/writer task
//! split and best-effort cleanup discipline are otherwise the same shape.

use super::dispatch;
use super::protocol::{JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};
use crate::manager::MemoryManager;
use log::{debug, error, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// Run the gateway: read JSON-RPC requests one per line from `stdin`,
/// dispatch each on its own task so slow tool calls don't head-of-line
/// block other in-flight requests, and write responses one per line to
/// `stdout` serialized through a single writer task.
pub async fn run(manager: Arc<MemoryManager>) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin).lines();

    let (tx, mut rx) = mpsc::channel::<String>(256);
    let writer_handle = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            if let Err(e) = stdout.write_all(line.as_bytes()).await {
                error!("[gateway] stdout write error: {e}");
                break;
            }
            if let Err(e) = stdout.write_all(b"\n").await {
                error!("[gateway] stdout write error: {e}");
                break;
            }
            if let Err(e) = stdout.flush().await {
                error!("[gateway] stdout flush error: {e}");
                break;
            }
        }
    });

    while let Some(line) = reader.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let manager = Arc::clone(&manager);
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = handle_line(line, &manager).await;
            if let Ok(serialized) = serde_json::to_string(&response) {
                let _ = tx.send(serialized).await;
            }
        });
    }

    drop(tx);
    let _ = writer_handle.await;
    Ok(())
}

async fn handle_line(line: &str, manager: &Arc<MemoryManager>) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            warn!("[gateway] failed to parse request: {e}");
            return JsonRpcResponse::failure(Value::Null, PARSE_ERROR, format!("parse error: {e}"));
        }
    };

    debug!("[gateway] dispatching method={}", request.method);
    dispatch::handle(manager, request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parse_error_on_malformed_line() {
        let config = test_manager().await;
        let resp = handle_line("not json", &config).await;
        assert!(resp.error.is_some());
        assert_eq!(resp.error.unwrap().code, PARSE_ERROR);
    }

    async fn test_manager() -> Arc<MemoryManager> {
        use crate::config::{Config, EmbeddingProviderType, VectorStoreType};
        use crate::embedding::LocalEmbeddingProvider;
        use crate::vector_store::InProcessVectorStore;

        let config = Config {
            vector_store_type: VectorStoreType::Memory,
            embedding_provider_type: EmbeddingProviderType::Local,
            working_memory_ttl_ms: 1_800_000,
            short_term_memory_ttl_ms: 604_800_000,
            long_term_memory_ttl_ms: 31_536_000_000,
            consolidation_threshold: 100,
            consolidation_age_ms: 2_592_000_000,
            decay_rate: 0.1,
            decay_interval_ms: 86_400_000,
            openai_api_key: None,
            openai_embedding_model: "text-embedding-3-small".into(),
            openai_embedding_dimensions: 1536,
            weaviate_url: None,
            weaviate_api_key: None,
            pinecone_api_key: None,
            pinecone_index: "memory-mcp".into(),
        };
        Arc::new(MemoryManager::new(
            Arc::new(InProcessVectorStore::new()),
            Arc::new(LocalEmbeddingProvider::new(512)),
            &config,
        ))
    }
}
