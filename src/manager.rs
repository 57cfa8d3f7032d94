//! `MemoryManager`: the domain engine — store, search, recall, consolidate,
//! forget, applyDecay, rebalanceLayers. Owns the `VectorStore` and
//! `EmbeddingProvider` capabilities and the `WorkingCache`; the sole
//! mutator of records.
//!
//! Grounded on the teacher's `engine/memory/mod.rs` (pipeline shape,
//! logging idiom) and `engine/engram/consolidation.rs` (tag/group
//! partitioning, inline test style).

use crate::cache::WorkingCache;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::{EngineError, EngineResult};
use crate::locks::LockTable;
use crate::record::{now_millis, Layer, Record, Source, MIN_IMPORTANCE};
use crate::vector_store::{SearchFilter, SearchHit, VectorStore};
use log::{info, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct StoreOptions {
    pub importance: f64,
    pub tags: Vec<String>,
    pub source: Source,
    pub layer: Option<Layer>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            importance: 0.5,
            tags: Vec::new(),
            source: Source::Agent,
            layer: None,
        }
    }
}

#[derive(Default)]
pub struct SearchOptions {
    pub limit: usize,
    pub layer_filter: Vec<Layer>,
    pub tags: Vec<String>,
    pub min_relevance: f64,
}

impl SearchOptions {
    pub fn defaults() -> Self {
        SearchOptions {
            limit: 10,
            layer_filter: Vec::new(),
            tags: Vec::new(),
            min_relevance: 0.0,
        }
    }
}

pub struct RecallResult {
    pub memories: Vec<SearchHit>,
    pub summary: String,
}

pub struct ConsolidateOptions {
    pub older_than: i64,
    pub target_size: usize,
    pub layer: Layer,
}

pub struct ConsolidationResult {
    pub consolidated: Vec<Record>,
    pub deleted: Vec<String>,
    pub summary: String,
}

#[derive(Default)]
pub struct ForgetOptions {
    pub memory_id: Option<String>,
    pub older_than: Option<i64>,
    pub layer: Option<Layer>,
    pub reason: Option<String>,
}

pub struct ForgetResult {
    pub deleted: Vec<String>,
    pub reason: String,
}

#[derive(Default, Clone)]
pub struct Stats {
    pub total_memories: usize,
    pub by_layer: HashMap<Layer, usize>,
    pub avg_importance: f64,
    pub oldest_memory: Option<i64>,
    pub newest_memory: Option<i64>,
}

pub struct MemoryManager {
    vector_store: Arc<dyn VectorStore>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    cache: Mutex<WorkingCache>,
    locks: LockTable,
    decay_rate: f64,
    ttl: HashMap<Layer, i64>,
}

const MAX_CONTENT_LEN: usize = 10_000;

impl MemoryManager {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedding_provider: Arc<dyn EmbeddingProvider>, config: &Config) -> Self {
        let mut ttl = HashMap::new();
        for layer in [Layer::Working, Layer::ShortTerm, Layer::LongTerm] {
            ttl.insert(layer, config.ttl_for(layer));
        }

        MemoryManager {
            vector_store,
            embedding_provider,
            cache: Mutex::new(WorkingCache::new(crate::cache::DEFAULT_CAPACITY)),
            locks: LockTable::new(),
            decay_rate: config.decay_rate,
            ttl,
        }
    }

    /// Populate the WorkingCache from the backing store. Call once at
    /// startup.
    pub async fn bootstrap_cache(&self) -> EngineResult<()> {
        let all = self.vector_store.list(&SearchFilter::default()).await?;
        self.cache.lock().bootstrap(all, now_millis());
        Ok(())
    }

    pub async fn store(&self, content: String, options: StoreOptions) -> EngineResult<Record> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(EngineError::validation("content must not be empty"));
        }
        if content.len() > MAX_CONTENT_LEN {
            return Err(EngineError::validation(format!(
                "content exceeds {MAX_CONTENT_LEN} characters"
            )));
        }

        let layer = options.layer.unwrap_or_else(|| Layer::by_importance(options.importance));
        let mut record = Record::new(trimmed.to_string(), options.importance, options.source, options.tags, layer);

        let embedding = self
            .embedding_provider
            .embed(&record.content)
            .await
            .map_err(|e| EngineError::backend("store: embed", e))?;
        record.embedding = Some(embedding);

        let _guard = self.locks.lock(&record.id).await;
        self.vector_store.store(&record).await?;
        self.cache.lock().put(record.clone());

        info!(
            "[memory] stored id={} layer={} importance={:.2}",
            record.id,
            record.layer.as_str(),
            record.importance
        );
        Ok(record)
    }

    pub async fn search(&self, query: &str, options: SearchOptions) -> EngineResult<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(EngineError::validation("query must not be empty"));
        }
        let limit = options.limit.clamp(1, 100);

        let query_vector = self
            .embedding_provider
            .embed(query)
            .await
            .map_err(|e| EngineError::backend("search: embed", e))?;

        // Single-layer fast path passes the layer to the backend; multiple
        // layers are honored via client-side filtering after over-fetch
        // (spec §9 — do not copy the "first layer only" shortcut).
        let single_layer = if options.layer_filter.len() == 1 {
            Some(options.layer_filter[0])
        } else {
            None
        };
        let filter = SearchFilter {
            layer: single_layer,
            tags: options.tags.clone(),
            min_importance: None,
        };

        let over_fetch = if options.layer_filter.len() > 1 { 3 * limit } else { 2 * limit };
        let mut hits = self.vector_store.search(&query_vector, over_fetch, &filter).await?;

        if options.layer_filter.len() > 1 {
            let allowed: HashSet<Layer> = options.layer_filter.iter().copied().collect();
            hits.retain(|h| allowed.contains(&h.record.layer));
        }

        hits.retain(|h| h.relevance >= options.min_relevance);
        hits.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap());
        hits.truncate(limit);

        // Per-id critical sections make these independent; run the
        // write-backs concurrently rather than serializing on each other
        // (spec §9: batch access-counter updates where possible).
        let write_backs = hits.iter().map(|hit| self.touch_access(&hit.record.id));
        for (hit, outcome) in hits.iter().zip(futures::future::join_all(write_backs).await) {
            if let Err(e) = outcome {
                warn!("[memory] access-counter write-back failed for {}: {e}", hit.record.id);
            }
        }

        Ok(hits)
    }

    /// Best-effort bump of accessCount/lastAccessed within the record's
    /// per-id critical section.
    async fn touch_access(&self, id: &str) -> EngineResult<()> {
        let _guard = self.locks.lock(id).await;
        let Some(mut record) = self.vector_store.get(id).await? else {
            return Ok(());
        };
        record.access_count += 1;
        record.last_accessed = now_millis();
        self.vector_store.update(&record).await?;
        self.cache.lock().put(record);
        Ok(())
    }

    pub async fn recall(&self, task: &str, context: Option<&str>, limit: usize) -> EngineResult<RecallResult> {
        let query = match context {
            Some(ctx) => format!("{task}\n\nContext: {ctx}"),
            None => task.to_string(),
        };
        let options = SearchOptions {
            limit,
            layer_filter: vec![Layer::Working, Layer::ShortTerm, Layer::LongTerm],
            tags: Vec::new(),
            min_relevance: 0.0,
        };
        let memories = self.search(&query, options).await?;

        let mut counts: HashMap<Layer, usize> = HashMap::new();
        for hit in &memories {
            *counts.entry(hit.record.layer).or_insert(0) += 1;
        }
        let summary = format!(
            "Found {} memories (working: {}, short-term: {}, long-term: {})",
            memories.len(),
            counts.get(&Layer::Working).copied().unwrap_or(0),
            counts.get(&Layer::ShortTerm).copied().unwrap_or(0),
            counts.get(&Layer::LongTerm).copied().unwrap_or(0),
        );

        Ok(RecallResult { memories, summary })
    }

    pub async fn consolidate(&self, options: ConsolidateOptions) -> EngineResult<ConsolidationResult> {
        let all_in_layer = self
            .vector_store
            .list(&SearchFilter {
                layer: Some(options.layer),
                ..Default::default()
            })
            .await?;

        let candidates: Vec<Record> = all_in_layer
            .into_iter()
            .filter(|r| r.timestamp < options.older_than)
            .collect();

        if candidates.len() < options.target_size {
            return Ok(ConsolidationResult {
                consolidated: Vec::new(),
                deleted: Vec::new(),
                summary: format!(
                    "Not enough candidates to consolidate: {} < target size {}",
                    candidates.len(),
                    options.target_size
                ),
            });
        }

        // Partition the full candidate pool by primary tag (spec §4.D
        // step 4 onward). `targetSize` already gated whether consolidation
        // runs at all (step 2, above); it is not a second score-ranked
        // retain cutout taken out of `candidates` before grouping — see
        // DESIGN.md's Open Question resolution for why.
        let mut groups: HashMap<String, Vec<Record>> = HashMap::new();
        for record in candidates {
            let primary_tag = record.tags.first().cloned().unwrap_or_else(|| "uncategorized".to_string());
            groups.entry(primary_tag).or_default().push(record);
        }

        let mut consolidated = Vec::new();
        let mut deleted = Vec::new();
        let mut retained_count = 0;

        for (primary_tag, mut group) in groups {
            if group.len() < 3 {
                retained_count += group.len();
                continue;
            }
            // Deterministic ordering for the consolidated record's
            // start/end timestamps and content summary.
            group.sort_by_key(|r| r.timestamp);

            let content = build_consolidated_content(&group);
            let importance = (group.iter().map(|r| r.importance).sum::<f64>() / group.len() as f64) * 0.9;

            let mut tag_set: HashSet<String> = group.iter().flat_map(|r| r.tags.iter().cloned()).collect();
            tag_set.insert(primary_tag);
            tag_set.insert("consolidated".to_string());
            let tags: Vec<String> = tag_set.into_iter().collect();

            let stored = self
                .store(
                    content,
                    StoreOptions {
                        importance,
                        tags,
                        source: Source::System,
                        layer: Some(Layer::LongTerm),
                    },
                )
                .await?;
            consolidated.push(stored);

            for record in &group {
                let _guard = self.locks.lock(&record.id).await;
                if self.vector_store.delete(&record.id).await? {
                    deleted.push(record.id.clone());
                }
                self.cache.lock().remove(&record.id);
            }
        }

        let summary = format!(
            "Consolidated {} groups into {} records, deleted {} original records; {} records retained unconsolidated",
            consolidated.len(),
            consolidated.len(),
            deleted.len(),
            retained_count
        );

        info!("[memory] consolidate: {summary}");
        Ok(ConsolidationResult {
            consolidated,
            deleted,
            summary,
        })
    }

    pub async fn forget(&self, options: ForgetOptions) -> EngineResult<ForgetResult> {
        if options.memory_id.is_none() && options.older_than.is_none() && options.layer.is_none() {
            return Err(EngineError::validation(
                "forget requires one of memoryId, olderThan, or layer",
            ));
        }

        let mut deleted = Vec::new();

        if let Some(id) = &options.memory_id {
            let _guard = self.locks.lock(id).await;
            if self.vector_store.delete(id).await? {
                deleted.push(id.clone());
                self.cache.lock().remove(id);
            }
            let reason = options.reason.clone().unwrap_or_else(|| "Explicit deletion".to_string());
            return Ok(ForgetResult { deleted, reason });
        }

        let filter = SearchFilter {
            layer: options.layer,
            ..Default::default()
        };
        let listed = self.vector_store.list(&filter).await?;

        let to_delete: Vec<Record> = match options.older_than {
            // Correct predicate: delete records OLDER than the threshold
            // (spec §9 — the source's inverted predicate is not copied).
            Some(older_than) => listed.into_iter().filter(|r| r.timestamp < older_than).collect(),
            None => listed,
        };

        for record in &to_delete {
            let _guard = self.locks.lock(&record.id).await;
            if self.vector_store.delete(&record.id).await? {
                deleted.push(record.id.clone());
            }
            self.cache.lock().remove(&record.id);
        }

        let reason = options
            .reason
            .unwrap_or_else(|| format!("Deleted {} records matching forget criteria", deleted.len()));

        Ok(ForgetResult { deleted, reason })
    }

    pub async fn get(&self, id: &str) -> EngineResult<Option<Record>> {
        if let Some(cached) = self.cache.lock().get(id) {
            return Ok(Some(cached.clone()));
        }
        self.vector_store.get(id).await
    }

    pub async fn list(&self, layer: Option<Layer>, tags: Vec<String>, limit: usize) -> EngineResult<Vec<Record>> {
        let filter = SearchFilter {
            layer,
            tags,
            min_importance: None,
        };
        let mut records = self.vector_store.list(&filter).await?;
        records.truncate(limit.clamp(1, 1000));
        Ok(records)
    }

    /// Stats via list-per-layer (spec §9: preferred over a cosine scan
    /// against an empty query vector).
    pub async fn stats(&self) -> EngineResult<Stats> {
        let mut by_layer = HashMap::new();
        let mut all = Vec::new();
        for layer in [Layer::Working, Layer::ShortTerm, Layer::LongTerm] {
            let records = self
                .vector_store
                .list(&SearchFilter {
                    layer: Some(layer),
                    ..Default::default()
                })
                .await?;
            by_layer.insert(layer, records.len());
            all.extend(records);
        }

        let total = all.len();
        let avg_importance = if total == 0 {
            0.0
        } else {
            all.iter().map(|r| r.importance).sum::<f64>() / total as f64
        };
        let oldest = all.iter().map(|r| r.timestamp).min();
        let newest = all.iter().map(|r| r.timestamp).max();

        Ok(Stats {
            total_memories: total,
            by_layer,
            avg_importance,
            oldest_memory: oldest,
            newest_memory: newest,
        })
    }

    /// Scheduled: exponential importance decay, floored at 0.1.
    pub async fn apply_decay(&self) -> EngineResult<usize> {
        let now = now_millis();
        let all = self.vector_store.list(&SearchFilter::default()).await?;
        let mut updated = 0;

        for record in all {
            if record.age_days(now) < 1.0 {
                continue;
            }
            let _guard = self.locks.lock(&record.id).await;
            // Re-read inside the critical section: tolerate concurrent
            // per-record writes per spec §5.
            let Some(mut current) = self.vector_store.get(&record.id).await? else {
                continue;
            };
            let age_days = current.age_days(now);
            current.importance = (current.importance * (-self.decay_rate * age_days / 30.0).exp()).max(MIN_IMPORTANCE);
            self.vector_store.update(&current).await?;
            self.cache.lock().put(current);
            updated += 1;
        }

        Ok(updated)
    }

    /// Scheduled: layer promotion/demotion based on score and TTL.
    pub async fn rebalance_layers(&self) -> EngineResult<usize> {
        let now = now_millis();
        let all = self.vector_store.list(&SearchFilter::default()).await?;
        let mut transitioned = 0;

        for record in all {
            let _guard = self.locks.lock(&record.id).await;
            let Some(mut current) = self.vector_store.get(&record.id).await? else {
                continue;
            };

            let score = current.memory_score(now, self.decay_rate);
            let age = now - current.timestamp;
            let ttl = *self.ttl.get(&current.layer).unwrap_or(&i64::MAX);

            let mut changed = false;
            if age > ttl && score < 0.3 {
                if current.layer == Layer::LongTerm {
                    current.importance = (current.importance * 0.5).max(MIN_IMPORTANCE);
                } else {
                    current.layer = current.layer.demote();
                }
                changed = true;
            } else if score > 0.8 && current.layer != Layer::LongTerm {
                current.layer = Layer::LongTerm;
                changed = true;
            }

            if changed {
                self.vector_store.update(&current).await?;
                self.cache.lock().put(current);
                transitioned += 1;
            }
        }

        Ok(transitioned)
    }
}

fn build_consolidated_content(group: &[Record]) -> String {
    let n = group.len();
    let start = group.iter().map(|r| r.timestamp).min().unwrap_or(0);
    let end = group.iter().map(|r| r.timestamp).max().unwrap_or(0);

    let mut tag_freq: HashMap<&str, usize> = HashMap::new();
    for r in group {
        for t in &r.tags {
            *tag_freq.entry(t.as_str()).or_insert(0) += 1;
        }
    }
    let mut top_tags: Vec<(&str, usize)> = tag_freq.into_iter().collect();
    top_tags.sort_by(|a, b| b.1.cmp(&a.1));
    let top3: Vec<&str> = top_tags.into_iter().take(3).map(|(t, _)| t).collect();

    let summary: Vec<String> = group.iter().take(3).map(|r| r.content.clone()).collect();
    let suffix = if group.len() > 3 { "[...]" } else { "" };

    format!(
        "[Consolidated Memory: {n} entries from {start} to {end}]\nTags: {}\nSummary: {}{suffix}",
        top3.join(", "),
        summary.join(" | ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingProviderType, VectorStoreType};
    use crate::embedding::LocalEmbeddingProvider;
    use crate::vector_store::InProcessVectorStore;

    fn test_config() -> Config {
        Config {
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
        }
    }

    fn manager() -> MemoryManager {
        let config = test_config();
        MemoryManager::new(
            Arc::new(InProcessVectorStore::new()),
            Arc::new(LocalEmbeddingProvider::new(512)),
            &config,
        )
    }

    #[tokio::test]
    async fn scenario_1_initial_layer_mapping() {
        let m = manager();
        let a = m.store("A".into(), StoreOptions { importance: 0.3, ..Default::default() }).await.unwrap();
        let b = m.store("B".into(), StoreOptions { importance: 0.6, ..Default::default() }).await.unwrap();
        let c = m.store("C".into(), StoreOptions { importance: 0.9, ..Default::default() }).await.unwrap();
        assert_eq!(a.layer, Layer::Working);
        assert_eq!(b.layer, Layer::ShortTerm);
        assert_eq!(c.layer, Layer::LongTerm);
    }

    #[tokio::test]
    async fn scenario_2_layer_filtering() {
        let m = manager();
        m.store("Test working".into(), StoreOptions { layer: Some(Layer::Working), ..Default::default() }).await.unwrap();
        m.store("Test short".into(), StoreOptions { layer: Some(Layer::ShortTerm), ..Default::default() }).await.unwrap();
        m.store("Test long".into(), StoreOptions { layer: Some(Layer::LongTerm), ..Default::default() }).await.unwrap();

        let results = m
            .search(
                "Test",
                SearchOptions {
                    limit: 10,
                    layer_filter: vec![Layer::Working],
                    tags: Vec::new(),
                    min_relevance: 0.0,
                },
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.layer, Layer::Working);
    }

    #[tokio::test]
    async fn scenario_3_access_counting() {
        let m = manager();
        let stored = m.store("Hello".into(), StoreOptions::default()).await.unwrap();

        m.search("Hello", SearchOptions::defaults()).await.unwrap();
        m.search("Hello", SearchOptions::defaults()).await.unwrap();

        let fetched = m.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.access_count, 2);
        assert!(fetched.last_accessed >= stored.last_accessed);
    }

    #[tokio::test]
    async fn scenario_4_consolidation_two_tags() {
        let m = manager();
        let backdated = now_millis() - 40 * 86_400_000;

        // Distinct timestamps (one hour apart) so the tag-group partition
        // and consolidated-record ordering are deterministic rather than
        // depending on HashMap/VectorStore iteration order.
        for i in 0..6 {
            let mut r = m
                .store(format!("topic-A memory {i}"), StoreOptions { importance: 0.6, tags: vec!["topic-A".into()], ..Default::default() })
                .await
                .unwrap();
            r.timestamp = backdated + i as i64 * 3_600_000;
            m.vector_store.update(&r).await.unwrap();
        }
        for i in 0..4 {
            let mut r = m
                .store(format!("topic-B memory {i}"), StoreOptions { importance: 0.6, tags: vec!["topic-B".into()], ..Default::default() })
                .await
                .unwrap();
            r.timestamp = backdated + i as i64 * 3_600_000;
            m.vector_store.update(&r).await.unwrap();
        }

        let result = m
            .consolidate(ConsolidateOptions {
                older_than: now_millis() - 30 * 86_400_000,
                target_size: 3,
                layer: Layer::ShortTerm,
            })
            .await
            .unwrap();

        assert_eq!(result.consolidated.len(), 2);
        assert_eq!(result.deleted.len(), 10);
        for c in &result.consolidated {
            assert_eq!(c.layer, Layer::LongTerm);
            assert!((c.importance - 0.54).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn scenario_5_decay_determinism() {
        let m = manager();
        let stored = m.store("aging".into(), StoreOptions { importance: 1.0, ..Default::default() }).await.unwrap();
        let mut backdated = stored.clone();
        backdated.timestamp = now_millis() - 30 * 86_400_000;
        m.vector_store.update(&backdated).await.unwrap();

        m.apply_decay().await.unwrap();

        let after = m.get(&stored.id).await.unwrap().unwrap();
        let expected = (1.0_f64 * (-0.1_f64).exp()).max(MIN_IMPORTANCE);
        assert!((after.importance - expected).abs() < 1e-6);
        assert!((after.importance - 0.904_837).abs() < 1e-5);
    }

    #[tokio::test]
    async fn scenario_6_forget_by_layer() {
        let m = manager();
        for i in 0..3 {
            m.store(format!("working {i}"), StoreOptions { layer: Some(Layer::Working), ..Default::default() }).await.unwrap();
        }

        let result = m.forget(ForgetOptions { layer: Some(Layer::Working), ..Default::default() }).await.unwrap();
        assert_eq!(result.deleted.len(), 3);

        let remaining = m.list(Some(Layer::Working), Vec::new(), 100).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn forget_requires_at_least_one_criterion() {
        let m = manager();
        let err = m.forget(ForgetOptions::default()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn forget_unknown_id_returns_empty_not_error() {
        let m = manager();
        let result = m.forget(ForgetOptions { memory_id: Some("does-not-exist".into()), ..Default::default() }).await.unwrap();
        assert!(result.deleted.is_empty());
    }

    #[tokio::test]
    async fn consolidate_below_target_size_is_a_noop() {
        let m = manager();
        m.store("only one".into(), StoreOptions { tags: vec!["a".into()], ..Default::default() }).await.unwrap();

        let result = m
            .consolidate(ConsolidateOptions { older_than: now_millis() + 1, target_size: 50, layer: Layer::Working })
            .await
            .unwrap();
        assert!(result.consolidated.is_empty());
        assert!(result.deleted.is_empty());
    }

    #[tokio::test]
    async fn rebalance_promotes_high_score_records() {
        let m = manager();
        let stored = m.store("important".into(), StoreOptions { importance: 1.0, layer: Some(Layer::Working), ..Default::default() }).await.unwrap();
        let mut boosted = stored.clone();
        boosted.access_count = 1000;
        m.vector_store.update(&boosted).await.unwrap();

        m.rebalance_layers().await.unwrap();

        let after = m.get(&stored.id).await.unwrap().unwrap();
        assert_eq!(after.layer, Layer::LongTerm);
    }

    #[tokio::test]
    async fn store_rejects_empty_content() {
        let m = manager();
        let err = m.store("   ".into(), StoreOptions::default()).await;
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn store_rejects_oversized_content() {
        let m = manager();
        let content = "a".repeat(MAX_CONTENT_LEN + 1);
        let err = m.store(content, StoreOptions::default()).await;
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn store_accepts_boundary_length() {
        let m = manager();
        let content = "a".repeat(MAX_CONTENT_LEN);
        let result = m.store(content, StoreOptions::default()).await;
        assert!(result.is_ok());
    }
}
