//! In-process adapter: a map keyed by id; search is a linear scan
//! computing cosine similarity, returned sorted descending. Default
//! adapter, and the fixture used by `manager.rs`'s unit tests.

use super::{cosine_similarity, SearchFilter, SearchHit, VectorStore};
use crate::error::EngineResult;
use crate::record::Record;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

pub struct InProcessVectorStore {
    records: Mutex<HashMap<String, Record>>,
}

impl InProcessVectorStore {
    pub fn new() -> Self {
        InProcessVectorStore {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InProcessVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InProcessVectorStore {
    async fn initialize(&self) -> EngineResult<()> {
        Ok(())
    }

    async fn store(&self, record: &Record) -> EngineResult<()> {
        self.records.lock().insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn search(&self, vector: &[f32], k: usize, filter: &SearchFilter) -> EngineResult<Vec<SearchHit>> {
        let records = self.records.lock();
        let mut hits: Vec<SearchHit> = records
            .values()
            .filter(|r| filter.matches(r))
            .map(|r| {
                let relevance = r
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(vector, e))
                    .unwrap_or(0.0);
                SearchHit {
                    record: r.clone(),
                    relevance,
                }
            })
            .collect();
        hits.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap());
        hits.truncate(k);
        Ok(hits)
    }

    async fn get(&self, id: &str) -> EngineResult<Option<Record>> {
        Ok(self.records.lock().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> EngineResult<bool> {
        Ok(self.records.lock().remove(id).is_some())
    }

    async fn list(&self, filter: &SearchFilter) -> EngineResult<Vec<Record>> {
        let records = self.records.lock();
        let mut out: Vec<Record> = records.values().filter(|r| filter.matches(r)).cloned().collect();
        out.sort_by_key(|r| r.timestamp);
        out.truncate(1000);
        Ok(out)
    }

    async fn update(&self, record: &Record) -> EngineResult<()> {
        self.records.lock().insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn close(&self) -> EngineResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Layer, Source};

    fn sample(importance: f64, layer: Layer) -> Record {
        let mut r = Record::new("hello world".into(), importance, Source::Agent, vec![], layer);
        r.embedding = Some(vec![1.0, 0.0, 0.0]);
        r
    }

    #[tokio::test]
    async fn store_then_get_round_trips() {
        let store = InProcessVectorStore::new();
        let r = sample(0.5, Layer::Working);
        store.store(&r).await.unwrap();
        let fetched = store.get(&r.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "hello world");
    }

    #[tokio::test]
    async fn search_respects_layer_filter() {
        let store = InProcessVectorStore::new();
        let working = sample(0.3, Layer::Working);
        let long_term = sample(0.9, Layer::LongTerm);
        store.store(&working).await.unwrap();
        store.store(&long_term).await.unwrap();

        let filter = SearchFilter {
            layer: Some(Layer::Working),
            ..Default::default()
        };
        let hits = store.search(&[1.0, 0.0, 0.0], 10, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, working.id);
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let store = InProcessVectorStore::new();
        let r = sample(0.5, Layer::Working);
        store.store(&r).await.unwrap();
        assert!(store.delete(&r.id).await.unwrap());
        assert!(store.get(&r.id).await.unwrap().is_none());
        assert!(!store.delete(&r.id).await.unwrap());
    }
}
