//! Translates the eight tool-call operations to `MemoryManager` calls.
//!
//! Grounded on the teacher's `engine/tools/memory.rs`: per-tool argument
//! extraction (`.ok_or(...)?`, `.clamp(...)`) and a `match`-based
//! dispatcher, adapted to return structured JSON (spec §6's exact return
//! shapes) rather than the teacher's human-readable strings, and to run
//! through the `validation` boundary module before touching the engine.

use super::protocol::{JsonRpcResponse, ToolDef, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use crate::error::EngineError;
use crate::manager::{ConsolidateOptions, ForgetOptions, MemoryManager, SearchOptions, StoreOptions};
use crate::record::{Layer, Source};
use crate::validation;
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn handle(manager: &Arc<MemoryManager>, request: super::protocol::JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone().unwrap_or(Value::Null);
    let params = request.params;

    let result = match request.method.as_str() {
        "tools/list" => Ok(json!(tool_definitions())),
        "memory_store" => memory_store(manager, params).await,
        "memory_search" => memory_search(manager, params).await,
        "memory_recall" => memory_recall(manager, params).await,
        "memory_consolidate" => memory_consolidate(manager, params).await,
        "memory_forget" => memory_forget(manager, params).await,
        "memory_list" => memory_list(manager, params).await,
        "memory_stats" => memory_stats(manager).await,
        other => {
            return JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("unknown method: {other}"));
        }
    };

    match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(EngineError::Validation(msg)) => JsonRpcResponse::failure(id, INVALID_PARAMS, msg),
        Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
    }
}

fn str_field<'a>(params: &'a Value, name: &str) -> Result<&'a str, EngineError> {
    params[name]
        .as_str()
        .ok_or_else(|| EngineError::validation(format!("memory_store: missing '{name}' argument")))
}

fn tags_field(params: &Value) -> Vec<String> {
    params["tags"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

async fn memory_store(manager: &Arc<MemoryManager>, params: Value) -> Result<Value, EngineError> {
    let content = str_field(&params, "content")?.to_string();
    let importance = params["importance"].as_f64().unwrap_or(0.5);
    let tags = tags_field(&params);
    let source = match params["source"].as_str() {
        Some(s) => validation::validate_source(s)?,
        None => Source::Agent,
    };
    let layer = match params["layer"].as_str() {
        Some(l) => Some(validation::validate_layer(l)?),
        None => None,
    };

    validation::validate_content(&content)?;
    validation::validate_importance(importance)?;
    validation::validate_tags(&tags)?;

    let record = manager
        .store(content, StoreOptions { importance, tags, source, layer })
        .await?;

    Ok(json!({
        "memoryId": record.id,
        "timestamp": record.timestamp,
        "layer": record.layer.as_str(),
    }))
}

async fn memory_search(manager: &Arc<MemoryManager>, params: Value) -> Result<Value, EngineError> {
    let query = str_field(&params, "query")?.to_string();
    validation::validate_query(&query)?;

    let limit = validation::validate_search_limit(params["limit"].as_i64().unwrap_or(10))?;
    let min_relevance = params["minRelevance"].as_f64().unwrap_or(0.0);
    validation::validate_min_relevance(min_relevance)?;

    let layer_filter: Vec<Layer> = params["layerFilter"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().and_then(Layer::from_str)).collect())
        .unwrap_or_default();
    let tags = tags_field(&params);

    let hits = manager
        .search(&query, SearchOptions { limit, layer_filter, tags, min_relevance })
        .await?;

    Ok(json!(hits
        .into_iter()
        .map(|h| json!({
            "id": h.record.id,
            "content": h.record.content,
            "relevance": h.relevance,
            "metadata": record_metadata(&h.record),
        }))
        .collect::<Vec<_>>()))
}

async fn memory_recall(manager: &Arc<MemoryManager>, params: Value) -> Result<Value, EngineError> {
    let task = str_field(&params, "task")?.to_string();
    validation::validate_task(&task)?;

    let context = params["context"].as_str().map(|s| s.to_string());
    if let Some(ctx) = &context {
        validation::validate_context(ctx)?;
    }
    let limit = validation::validate_recall_limit(params["limit"].as_i64().unwrap_or(10))?;

    let result = manager.recall(&task, context.as_deref(), limit).await?;

    Ok(json!({
        "summary": result.summary,
        "memories": result.memories.into_iter().map(|h| json!({
            "id": h.record.id,
            "content": h.record.content,
            "relevance": h.relevance,
            "metadata": record_metadata(&h.record),
        })).collect::<Vec<_>>(),
    }))
}

async fn memory_consolidate(manager: &Arc<MemoryManager>, params: Value) -> Result<Value, EngineError> {
    let older_than = params["olderThan"]
        .as_i64()
        .unwrap_or_else(|| crate::record::now_millis() - 30 * 86_400_000);
    let target_size = validation::validate_target_size(params["targetSize"].as_i64().unwrap_or(50))?;
    let layer = match params["layer"].as_str() {
        Some(l) => validation::validate_layer(l)?,
        None => Layer::ShortTerm,
    };

    let result = manager.consolidate(ConsolidateOptions { older_than, target_size, layer }).await?;

    Ok(json!({
        "summary": result.summary,
        "consolidated": result.consolidated.iter().map(record_metadata).collect::<Vec<_>>(),
        "deletedCount": result.deleted.len(),
        "deleted": result.deleted,
    }))
}

async fn memory_forget(manager: &Arc<MemoryManager>, params: Value) -> Result<Value, EngineError> {
    let memory_id = params["memoryId"].as_str().map(|s| s.to_string());
    let older_than = params["olderThan"].as_i64();
    let layer = match params["layer"].as_str() {
        Some(l) => Some(validation::validate_layer(l)?),
        None => None,
    };
    let reason = params["reason"].as_str().map(|s| s.to_string());
    if let Some(r) = &reason {
        validation::validate_reason(r)?;
    }

    if memory_id.is_none() && older_than.is_none() && layer.is_none() {
        return Err(EngineError::validation(
            "memory_forget requires one of memoryId, olderThan, or layer",
        ));
    }

    let result = manager
        .forget(ForgetOptions { memory_id, older_than, layer, reason })
        .await?;

    Ok(json!({
        "deletedCount": result.deleted.len(),
        "deleted": result.deleted,
        "reason": result.reason,
    }))
}

async fn memory_list(manager: &Arc<MemoryManager>, params: Value) -> Result<Value, EngineError> {
    let layer = match params["layer"].as_str() {
        Some(l) => Some(validation::validate_layer(l)?),
        None => None,
    };
    let tags = tags_field(&params);
    let limit = validation::validate_list_limit(params["limit"].as_i64().unwrap_or(100))?;

    let records = manager.list(layer, tags, limit).await?;

    Ok(json!(records
        .into_iter()
        .map(|r| json!({
            "id": r.id,
            "content": content_head(&r.content),
            "metadata": record_metadata(&r),
        }))
        .collect::<Vec<_>>()))
}

async fn memory_stats(manager: &Arc<MemoryManager>) -> Result<Value, EngineError> {
    let stats = manager.stats().await?;
    Ok(json!({
        "totalMemories": stats.total_memories,
        "byLayer": {
            "working": stats.by_layer.get(&Layer::Working).copied().unwrap_or(0),
            "short-term": stats.by_layer.get(&Layer::ShortTerm).copied().unwrap_or(0),
            "long-term": stats.by_layer.get(&Layer::LongTerm).copied().unwrap_or(0),
        },
        "avgImportance": stats.avg_importance,
        "oldestMemory": stats.oldest_memory,
        "newestMemory": stats.newest_memory,
    }))
}

fn record_metadata(record: &crate::record::Record) -> Value {
    json!({
        "importance": record.importance,
        "source": match record.source {
            Source::User => "user",
            Source::Agent => "agent",
            Source::System => "system",
        },
        "tags": record.tags,
        "accessCount": record.access_count,
        "lastAccessed": record.last_accessed,
        "layer": record.layer.as_str(),
        "timestamp": record.timestamp,
    })
}

fn content_head(content: &str) -> String {
    const HEAD_LEN: usize = 200;
    if content.chars().count() <= HEAD_LEN {
        content.to_string()
    } else {
        content.chars().take(HEAD_LEN).collect::<String>() + "…"
    }
}

pub fn tool_definitions() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "memory_store",
            description: "Store a new memory record with optional importance, tags, source, and layer.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "content": {"type": "string", "maxLength": 10000},
                    "importance": {"type": "number", "minimum": 0, "maximum": 1, "default": 0.5},
                    "tags": {"type": "array", "items": {"type": "string", "maxLength": 50}, "maxItems": 50},
                    "source": {"type": "string", "enum": ["user", "agent", "system"], "default": "agent"},
                    "layer": {"type": "string", "enum": ["working", "short-term", "long-term"]},
                },
                "required": ["content"],
            }),
        },
        ToolDef {
            name: "memory_search",
            description: "Search stored memories by semantic similarity.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "maxLength": 1000},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 100, "default": 10},
                    "layerFilter": {"type": "array", "items": {"type": "string", "enum": ["working", "short-term", "long-term"]}},
                    "minRelevance": {"type": "number", "minimum": 0, "maximum": 1, "default": 0},
                    "tags": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["query"],
            }),
        },
        ToolDef {
            name: "memory_recall",
            description: "Semantic convenience search across all layers with a human-readable summary.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task": {"type": "string", "maxLength": 1000},
                    "context": {"type": "string", "maxLength": 5000},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 50, "default": 10},
                },
                "required": ["task"],
            }),
        },
        ToolDef {
            name: "memory_consolidate",
            description: "Consolidate aged memories within a layer into tag-grouped long-term summaries.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "olderThan": {"type": "integer"},
                    "targetSize": {"type": "integer", "minimum": 1, "maximum": 1000, "default": 50},
                    "layer": {"type": "string", "enum": ["working", "short-term", "long-term"], "default": "short-term"},
                },
            }),
        },
        ToolDef {
            name: "memory_forget",
            description: "Delete memories by id, age, or layer.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "memoryId": {"type": "string"},
                    "olderThan": {"type": "integer"},
                    "layer": {"type": "string", "enum": ["working", "short-term", "long-term"]},
                    "reason": {"type": "string", "maxLength": 500},
                },
            }),
        },
        ToolDef {
            name: "memory_list",
            description: "List memories, optionally filtered by layer and tags.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "layer": {"type": "string", "enum": ["working", "short-term", "long-term"]},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 1000, "default": 100},
                },
            }),
        },
        ToolDef {
            name: "memory_stats",
            description: "Return aggregate statistics about the memory store.",
            input_schema: json!({"type": "object", "properties": {}}),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EmbeddingProviderType, VectorStoreType};
    use crate::embedding::LocalEmbeddingProvider;
    use crate::gateway::protocol::JsonRpcRequest;
    use crate::vector_store::InProcessVectorStore;

    fn test_manager() -> Arc<MemoryManager> {
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

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: Some("2.0".into()),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn memory_store_returns_expected_shape() {
        let manager = test_manager();
        let resp = handle(&manager, request("memory_store", json!({"content": "hello"}))).await;
        let result = resp.result.unwrap();
        assert!(result["memoryId"].is_string());
        assert_eq!(result["layer"], "short-term");
    }

    #[tokio::test]
    async fn memory_store_missing_content_is_invalid_params() {
        let manager = test_manager();
        let resp = handle(&manager, request("memory_store", json!({}))).await;
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method_not_found() {
        let manager = test_manager();
        let resp = handle(&manager, request("memory_teleport", json!({}))).await;
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_list_returns_seven_tools() {
        let manager = test_manager();
        let resp = handle(&manager, request("tools/list", Value::Null)).await;
        let result = resp.result.unwrap();
        assert_eq!(result.as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn memory_forget_requires_a_criterion() {
        let manager = test_manager();
        let resp = handle(&manager, request("memory_forget", json!({}))).await;
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }
}
