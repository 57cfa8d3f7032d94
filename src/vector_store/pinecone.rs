//! Managed vector DB adapter (Pinecone-shaped): a namespaced index. Filters
//! map to the backend's native predicate language (`layer == v`, `tags
//! contains t` per requested tag, `importance >= v`). Listing is emulated
//! by querying against a zero vector with limit 1000.

use super::{SearchFilter, SearchHit, VectorStore};
use crate::error::{EngineError, EngineResult};
use crate::record::{Layer, Record, Source};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const NAMESPACE: &str = "memory-mcp";

pub struct PineconeVectorStore {
    client: Client,
    api_key: String,
    index: String,
    dimensions: usize,
}

impl PineconeVectorStore {
    pub fn new(api_key: String, index: String, dimensions: usize) -> Self {
        PineconeVectorStore {
            client: Client::new(),
            api_key,
            index,
            dimensions,
        }
    }

    fn base_url(&self) -> String {
        format!("https://{}.svc.pinecone.io", self.index)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .timeout(Duration::from_secs(30))
    }

    fn native_filter(filter: &SearchFilter) -> Option<Value> {
        let mut clauses = Vec::new();
        if let Some(layer) = filter.layer {
            clauses.push(json!({ "layer": { "$eq": layer.as_str() } }));
        }
        for tag in &filter.tags {
            clauses.push(json!({ "tags": { "$in": [tag] } }));
        }
        if let Some(min) = filter.min_importance {
            clauses.push(json!({ "importance": { "$gte": min } }));
        }
        if clauses.is_empty() {
            None
        } else if clauses.len() == 1 {
            Some(clauses.remove(0))
        } else {
            Some(json!({ "$and": clauses }))
        }
    }

    fn record_to_metadata(record: &Record) -> Value {
        json!({
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

    fn metadata_to_record(id: &str, meta: &Value, vector: Option<Vec<f32>>) -> Option<Record> {
        Some(Record {
            id: id.to_string(),
            content: meta["content"].as_str().unwrap_or_default().to_string(),
            embedding: vector,
            timestamp: meta["timestamp"].as_i64().unwrap_or_default(),
            importance: meta["importance"].as_f64().unwrap_or(0.5),
            source: Source::from_str(meta["source"].as_str().unwrap_or("agent")).unwrap_or(Source::Agent),
            tags: meta["tags"]
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default(),
            access_count: meta["accessCount"].as_u64().unwrap_or(0),
            last_accessed: meta["lastAccessed"].as_i64().unwrap_or_default(),
            layer: Layer::from_str(meta["layer"].as_str().unwrap_or("working")).unwrap_or(Layer::Working),
        })
    }

    async fn query(&self, vector: &[f32], top_k: usize, filter: &SearchFilter, include_values: bool) -> EngineResult<Vec<SearchHit>> {
        let url = format!("{}/query", self.base_url());
        let mut body = json!({
            "namespace": NAMESPACE,
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": include_values,
        });
        if let Some(f) = Self::native_filter(filter) {
            body["filter"] = f;
        }

        let resp = self
            .request(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::backend("pinecone query", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::backend("pinecone query", format!("{status} — {text}")));
        }

        let v: Value = resp.json().await.map_err(|e| EngineError::backend("pinecone query", e))?;
        let empty = Vec::new();
        let matches = v["matches"].as_array().unwrap_or(&empty);

        let mut hits = Vec::new();
        for m in matches {
            let id = m["id"].as_str().unwrap_or_default();
            let score = m["score"].as_f64().unwrap_or(0.0).clamp(0.0, 1.0);
            let values = m["values"]
                .as_array()
                .map(|a| a.iter().filter_map(|x| x.as_f64().map(|f| f as f32)).collect());
            if let Some(record) = Self::metadata_to_record(id, &m["metadata"], values) {
                hits.push(SearchHit { record, relevance: score });
            }
        }
        Ok(hits)
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
impl VectorStore for PineconeVectorStore {
    async fn initialize(&self) -> EngineResult<()> {
        // Index creation/description is a control-plane operation managed
        // outside this process; the data-plane client assumes the index
        // and namespace already exist.
        Ok(())
    }

    async fn store(&self, record: &Record) -> EngineResult<()> {
        let embedding = record
            .embedding
            .as_ref()
            .ok_or_else(|| EngineError::validation("store requires an embedding"))?;

        let url = format!("{}/vectors/upsert", self.base_url());
        let body = json!({
            "namespace": NAMESPACE,
            "vectors": [{
                "id": record.id,
                "values": embedding,
                "metadata": Self::record_to_metadata(record),
            }],
        });

        let resp = self
            .request(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::backend("pinecone store", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::backend("pinecone store", format!("{status} — {text}")));
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize, filter: &SearchFilter) -> EngineResult<Vec<SearchHit>> {
        self.query(vector, k, filter, false).await
    }

    async fn get(&self, id: &str) -> EngineResult<Option<Record>> {
        let url = format!("{}/vectors/fetch?ids={id}&namespace={NAMESPACE}", self.base_url());
        let resp = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| EngineError::backend("pinecone get", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::backend("pinecone get", format!("{status} — {text}")));
        }

        let v: Value = resp.json().await.map_err(|e| EngineError::backend("pinecone get", e))?;
        let Some(entry) = v["vectors"].get(id) else {
            return Ok(None);
        };
        let values = entry["values"]
            .as_array()
            .map(|a| a.iter().filter_map(|x| x.as_f64().map(|f| f as f32)).collect());
        Ok(Self::metadata_to_record(id, &entry["metadata"], values))
    }

    async fn delete(&self, id: &str) -> EngineResult<bool> {
        let url = format!("{}/vectors/delete", self.base_url());
        let body = json!({ "namespace": NAMESPACE, "ids": [id] });
        let resp = self
            .request(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::backend("pinecone delete", e))?;
        Ok(resp.status().is_success())
    }

    async fn list(&self, filter: &SearchFilter) -> EngineResult<Vec<Record>> {
        let zero_vector = vec![0.0f32; self.dimensions];
        let hits = self.query(&zero_vector, 1000, filter, false).await?;
        Ok(hits.into_iter().map(|h| h.record).collect())
    }

    async fn update(&self, record: &Record) -> EngineResult<()> {
        self.store(record).await
    }

    async fn close(&self) -> EngineResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_filter_combines_clauses() {
        let filter = SearchFilter {
            layer: Some(Layer::LongTerm),
            tags: vec!["a".into()],
            min_importance: Some(0.5),
        };
        let f = PineconeVectorStore::native_filter(&filter).unwrap();
        assert!(f["$and"].as_array().unwrap().len() == 3);
    }

    #[test]
    fn no_filter_is_none() {
        assert!(PineconeVectorStore::native_filter(&SearchFilter::default()).is_none());
    }

    #[test]
    fn metadata_round_trip() {
        let r = Record::new("hi".into(), 0.4, Source::System, vec!["x".into()], Layer::Working);
        let meta = PineconeVectorStore::record_to_metadata(&r);
        let back = PineconeVectorStore::metadata_to_record(&r.id, &meta, None).unwrap();
        assert_eq!(back.content, "hi");
        assert_eq!(back.source, Source::System);
    }

    #[test]
    fn dimensions_come_from_the_configured_embedding_provider_not_a_constant() {
        let store = PineconeVectorStore::new("key".into(), "idx".into(), 512);
        assert_eq!(store.dimensions, 512);
    }
}
