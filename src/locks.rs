//! Per-id sharded mutex table: constant-overhead pessimistic concurrency
//! for per-record write serialization (spec §5, §9).
//!
//! Grounded on the teacher's `engine/state.rs` choice of `parking_lot`
//! for process-wide mutable state.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

const SHARD_COUNT: usize = 64;

/// A fixed set of shards, each guarding an independent async mutex. Ids
/// hash deterministically to a shard, so two concurrent writers to the
/// same id always serialize, while writers to different ids usually
/// don't contend.
pub struct LockTable {
    shards: Vec<Arc<AsyncMutex<()>>>,
}

impl LockTable {
    pub fn new() -> Self {
        LockTable {
            shards: (0..SHARD_COUNT).map(|_| Arc::new(AsyncMutex::new(()))).collect(),
        }
    }

    fn shard_for(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.shards.len();
        Arc::clone(&self.shards[idx])
    }

    /// Acquire the per-id critical section. Holding the returned guard
    /// across `VectorStore`/`WorkingCache` I/O is the mechanism spec §5
    /// relies on for per-id write serialization.
    pub async fn lock(&self, id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        self.shard_for(id).lock_owned().await
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_maps_to_same_shard() {
        let table = LockTable::new();
        let a = table.shard_for("record-1");
        let b = table.shard_for("record-1");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn lock_serializes_same_id() {
        let table = Arc::new(LockTable::new());
        let t1 = {
            let table = Arc::clone(&table);
            tokio::spawn(async move {
                let _guard = table.lock("x").await;
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let start = std::time::Instant::now();
        let _guard = table.lock("x").await;
        assert!(start.elapsed() >= std::time::Duration::from_millis(10));
        t1.await.unwrap();
    }
}
