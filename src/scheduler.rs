//! Three independent periodic maintenance tasks: decay, rebalance, and
//! consolidation-when-needed. Each catches and logs its own failures; one
//! failing task must not stop the others. A single shutdown signal cancels
//! all of them.
//!
//! Grounded on the teacher's `lib.rs` heartbeat spawn pattern
//! (`tokio::spawn` + sleep loop, per-iteration logging), generalized from
//! one task to three, and on `engine/mcp/transport.rs`'s
//! cancellation-on-drop discipline for the shutdown signal.

use crate::config::Config;
use crate::manager::{ConsolidateOptions, MemoryManager};
use crate::record::Layer;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(manager: Arc<MemoryManager>, config: &Config) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let decay_interval = Duration::from_millis(config.decay_interval_ms);
        let consolidation_threshold = config.consolidation_threshold;
        let consolidation_age_ms = config.consolidation_age_ms;

        let handles = vec![
            spawn_loop("decay", decay_interval, shutdown_rx.clone(), {
                let manager = Arc::clone(&manager);
                move || {
                    let manager = Arc::clone(&manager);
                    async move {
                        let updated = manager.apply_decay().await?;
                        info!("[scheduler] decay applied to {updated} records");
                        Ok(())
                    }
                }
            }),
            spawn_loop("rebalance", Duration::from_secs(3600), shutdown_rx.clone(), {
                let manager = Arc::clone(&manager);
                move || {
                    let manager = Arc::clone(&manager);
                    async move {
                        let transitioned = manager.rebalance_layers().await?;
                        info!("[scheduler] rebalanced {transitioned} records");
                        Ok(())
                    }
                }
            }),
            spawn_loop("consolidation-check", Duration::from_secs(6 * 3600), shutdown_rx.clone(), {
                let manager = Arc::clone(&manager);
                move || {
                    let manager = Arc::clone(&manager);
                    async move {
                        let short_term = manager.list(Some(Layer::ShortTerm), Vec::new(), 1000).await?;
                        if short_term.len() > consolidation_threshold {
                            let result = manager
                                .consolidate(ConsolidateOptions {
                                    older_than: crate::record::now_millis() - consolidation_age_ms,
                                    target_size: consolidation_threshold,
                                    layer: Layer::ShortTerm,
                                })
                                .await?;
                            info!("[scheduler] consolidation triggered: {}", result.summary);
                        }
                        Ok(())
                    }
                }
            }),
        ];

        Scheduler { shutdown_tx, handles }
    }

    /// Cancel all timers; in-flight task iterations are allowed to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

fn spawn_loop<F, Fut>(name: &'static str, interval: Duration, mut shutdown: watch::Receiver<bool>, mut task: F) -> tokio::task::JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = crate::error::EngineResult<()>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick fires immediately; skip it, run on schedule

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = task().await {
                        error!("[scheduler] {name} iteration failed: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("[scheduler] {name} stopping");
                        break;
                    }
                }
            }
        }
    })
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
            decay_interval_ms: 3600_000,
            openai_api_key: None,
            openai_embedding_model: "text-embedding-3-small".into(),
            openai_embedding_dimensions: 1536,
            weaviate_url: None,
            weaviate_api_key: None,
            pinecone_api_key: None,
            pinecone_index: "memory-mcp".into(),
        }
    }

    #[tokio::test]
    async fn starts_and_stops_cleanly() {
        let config = test_config();
        let manager = Arc::new(MemoryManager::new(
            Arc::new(InProcessVectorStore::new()),
            Arc::new(LocalEmbeddingProvider::new(512)),
            &config,
        ));
        let scheduler = Scheduler::start(manager, &config);
        scheduler.stop().await;
    }
}
