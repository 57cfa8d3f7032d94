//! `WorkingCache`: a bounded in-process mapping from id to record (target
//! capacity ~100), write-through to the `VectorStore`.
//!
//! Grounded on the teacher's `engine/engram/working_memory.rs`: same
//! bounded-slot-map-with-eviction shape, same "not internally
//! synchronized, callers must wrap in a lock" contract — adapted from
//! token-budget eviction to the accessCount/recency ranking this spec
//! requires.

use crate::record::Record;
use std::collections::HashMap;

pub const DEFAULT_CAPACITY: usize = 100;

/// NOT internally synchronized. Callers (`manager.rs`) must perform cache
/// and VectorStore updates within the same per-id critical section so a
/// reader never observes a mixed pre/post image (invariant 6).
pub struct WorkingCache {
    capacity: usize,
    entries: HashMap<String, Record>,
}

impl WorkingCache {
    pub fn new(capacity: usize) -> Self {
        WorkingCache {
            capacity,
            entries: HashMap::new(),
        }
    }

    /// Populate from a full record list, ranked by `accessCount /
    /// (now - lastAccessed)` descending, keeping the top `capacity`.
    pub fn bootstrap(&mut self, mut records: Vec<Record>, now: i64) {
        records.sort_by(|a, b| {
            let score_a = recency_score(a, now);
            let score_b = recency_score(b, now);
            score_b.partial_cmp(&score_a).unwrap()
        });
        self.entries = records
            .into_iter()
            .take(self.capacity)
            .map(|r| (r.id.clone(), r))
            .collect();
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.entries.get(id)
    }

    pub fn put(&mut self, record: Record) {
        self.entries.insert(record.id.clone(), record);
    }

    pub fn remove(&mut self, id: &str) {
        self.entries.remove(id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn recency_score(record: &Record, now: i64) -> f64 {
    let age_ms = (now - record.last_accessed).max(1) as f64;
    (record.access_count as f64) / age_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Layer, Source};

    fn record(access_count: u64, last_accessed_offset_ms: i64) -> Record {
        let mut r = Record::new("x".into(), 0.5, Source::Agent, vec![], Layer::Working);
        r.access_count = access_count;
        r.last_accessed = crate::record::now_millis() - last_accessed_offset_ms;
        r
    }

    #[test]
    fn bootstrap_keeps_top_n_by_recency_score() {
        let mut cache = WorkingCache::new(1);
        let hot = record(100, 1_000);
        let cold = record(1, 1_000_000);
        cache.bootstrap(vec![cold.clone(), hot.clone()], crate::record::now_millis());
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&hot.id));
        assert!(!cache.contains(&cold.id));
    }

    #[test]
    fn put_then_remove() {
        let mut cache = WorkingCache::new(10);
        let r = record(0, 0);
        cache.put(r.clone());
        assert!(cache.contains(&r.id));
        cache.remove(&r.id);
        assert!(!cache.contains(&r.id));
    }
}
