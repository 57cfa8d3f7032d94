//! Self-hosted vector DB adapter (Weaviate-shaped): a graph-query backend.
//! (Re)creates a class named `Memory` with properties mirroring the record
//! metadata and an externally-supplied vector. Filter application is
//! client-side; `k` is over-fetched by a factor of 2 when any filter is set.

use super::{SearchFilter, SearchHit, VectorStore};
use crate::error::{EngineError, EngineResult};
use crate::record::{Layer, Record, Source};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const CLASS_NAME: &str = "Memory";

pub struct WeaviateVectorStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeaviateVectorStore {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        WeaviateVectorStore {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.timeout(Duration::from_secs(30));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn record_to_properties(record: &Record) -> Value {
        json!({
            "recordId": record.id,
            "content": record.content,
            "timestamp": record.timestamp,
            "importance": record.importance,
            "source": source_str(record.source),
            "tags": record.tags,
            "accessCount": record.access_count,
            "lastAccessed": record.last_accessed,
            "layer": record.layer.as_str(),
        })
    }

    fn properties_to_record(id_hint: &str, props: &Value, vector: Option<Vec<f32>>) -> Option<Record> {
        Some(Record {
            id: props["recordId"].as_str().unwrap_or(id_hint).to_string(),
            content: props["content"].as_str().unwrap_or_default().to_string(),
            embedding: vector,
            timestamp: props["timestamp"].as_i64().unwrap_or_default(),
            importance: props["importance"].as_f64().unwrap_or(0.5),
            source: Source::from_str(props["source"].as_str().unwrap_or("agent")).unwrap_or(Source::Agent),
            tags: props["tags"]
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default(),
            access_count: props["accessCount"].as_u64().unwrap_or(0),
            last_accessed: props["lastAccessed"].as_i64().unwrap_or_default(),
            layer: Layer::from_str(props["layer"].as_str().unwrap_or("working")).unwrap_or(Layer::Working),
        })
    }
}

fn source_str(s: Source) -> &'static str {
    match s {
        Source::User => "user",
        Source::Agent => "agent",
        Source::System => "system",
    }
}

#[async_trait]
impl VectorStore for WeaviateVectorStore {
    async fn initialize(&self) -> EngineResult<()> {
        let schema_url = format!("{}/v1/schema", self.base_url);
        let class_def = json!({
            "class": CLASS_NAME,
            "vectorizer": "none",
        });
        let resp = self
            .request(self.client.post(&schema_url))
            .json(&class_def)
            .send()
            .await
            .map_err(|e| EngineError::backend("weaviate initialize", e))?;
        // 200/201 = created, 422 = class already exists — both are fine (idempotent).
        if !resp.status().is_success() && resp.status().as_u16() != 422 {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::backend(
                "weaviate initialize",
                format!("schema creation failed {status} — {body}"),
            ));
        }
        Ok(())
    }

    async fn store(&self, record: &Record) -> EngineResult<()> {
        let embedding = record
            .embedding
            .as_ref()
            .ok_or_else(|| EngineError::validation("store requires an embedding"))?;

        let url = format!("{}/v1/objects", self.base_url);
        let body = json!({
            "class": CLASS_NAME,
            "id": weaviate_uuid(&record.id),
            "properties": Self::record_to_properties(record),
            "vector": embedding,
        });

        let resp = self
            .request(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::backend("weaviate store", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::backend("weaviate store", format!("{status} — {text}")));
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize, filter: &SearchFilter) -> EngineResult<Vec<SearchHit>> {
        let has_filter = filter.layer.is_some() || !filter.tags.is_empty() || filter.min_importance.is_some();
        let fetch_k = if has_filter { k * 2 } else { k };

        let vector_str = serde_json::to_string(vector).unwrap_or_default();
        let query = format!(
            "{{ Get {{ {CLASS_NAME}(limit: {fetch_k}, nearVector: {{ vector: {vector_str} }}) \
             {{ recordId content timestamp importance source tags accessCount lastAccessed layer \
             _additional {{ certainty vector }} }} }} }}"
        );

        let url = format!("{}/v1/graphql", self.base_url);
        let resp = self
            .request(self.client.post(&url))
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| EngineError::backend("weaviate search", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::backend("weaviate search", format!("{status} — {text}")));
        }

        let v: Value = resp.json().await.map_err(|e| EngineError::backend("weaviate search", e))?;
        let empty = Vec::new();
        let items = v["data"]["Get"][CLASS_NAME].as_array().unwrap_or(&empty);

        let mut hits = Vec::new();
        for item in items {
            let certainty = item["_additional"]["certainty"].as_f64().unwrap_or(0.0);
            let vec = item["_additional"]["vector"]
                .as_array()
                .map(|a| a.iter().filter_map(|x| x.as_f64().map(|f| f as f32)).collect());
            if let Some(record) = Self::properties_to_record("", item, vec) {
                if filter.matches(&record) {
                    hits.push(SearchHit {
                        record,
                        relevance: certainty,
                    });
                }
            }
        }
        hits.truncate(k);
        Ok(hits)
    }

    async fn get(&self, id: &str) -> EngineResult<Option<Record>> {
        let url = format!("{}/v1/objects/{}/{}", self.base_url, CLASS_NAME, weaviate_uuid(id));
        let resp = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| EngineError::backend("weaviate get", e))?;

        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::backend("weaviate get", format!("{status} — {text}")));
        }

        let v: Value = resp.json().await.map_err(|e| EngineError::backend("weaviate get", e))?;
        let vector = v["vector"]
            .as_array()
            .map(|a| a.iter().filter_map(|x| x.as_f64().map(|f| f as f32)).collect());
        Ok(Self::properties_to_record(id, &v["properties"], vector))
    }

    async fn delete(&self, id: &str) -> EngineResult<bool> {
        let url = format!("{}/v1/objects/{}/{}", self.base_url, CLASS_NAME, weaviate_uuid(id));
        let resp = self
            .request(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| EngineError::backend("weaviate delete", e))?;
        Ok(resp.status().is_success())
    }

    async fn list(&self, filter: &SearchFilter) -> EngineResult<Vec<Record>> {
        let query = format!(
            "{{ Get {{ {CLASS_NAME}(limit: 1000) {{ recordId content timestamp importance source tags \
             accessCount lastAccessed layer }} }} }}"
        );
        let url = format!("{}/v1/graphql", self.base_url);
        let resp = self
            .request(self.client.post(&url))
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| EngineError::backend("weaviate list", e))?;

        let v: Value = resp.json().await.map_err(|e| EngineError::backend("weaviate list", e))?;
        let empty = Vec::new();
        let items = v["data"]["Get"][CLASS_NAME].as_array().unwrap_or(&empty);

        let mut out = Vec::new();
        for item in items {
            if let Some(record) = Self::properties_to_record("", item, None) {
                if filter.matches(&record) {
                    out.push(record);
                }
            }
        }
        Ok(out)
    }

    async fn update(&self, record: &Record) -> EngineResult<()> {
        // Weaviate objects support partial metadata update, but this adapter
        // treats it as delete-then-insert to keep replacement atomic from
        // the engine's perspective, per the capability contract.
        let _ = self.delete(&record.id).await?;
        self.store(record).await
    }

    async fn close(&self) -> EngineResult<()> {
        Ok(())
    }
}

/// Weaviate object ids must be RFC4122 UUIDs; this crate's own ids already
/// are (see `Record::new`), so this is the identity function in practice,
/// but kept explicit as a seam in case an adapter is fed a foreign id.
fn weaviate_uuid(id: &str) -> String {
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_properties_round_trip() {
        let r = Record::new("hello".into(), 0.7, Source::User, vec!["a".into()], Layer::ShortTerm);
        let props = WeaviateVectorStore::record_to_properties(&r);
        let back = WeaviateVectorStore::properties_to_record(&r.id, &props, None).unwrap();
        assert_eq!(back.content, "hello");
        assert_eq!(back.layer, Layer::ShortTerm);
        assert_eq!(back.source, Source::User);
    }
}
