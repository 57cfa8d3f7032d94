//! Process entry point: load configuration, wire the embedding provider
//! and vector store, bootstrap the working cache, start the maintenance
//! scheduler, and run the gateway against stdio until EOF or a shutdown
//! signal.
//!
//! Grounded on the teacher's `main.rs`/`lib.rs` startup sequence
//! (env_logger init, fatal config errors exit the process with a
//! non-zero status, graceful shutdown of background tasks before exit).

mod cache;
mod config;
mod embedding;
mod error;
mod gateway;
mod locks;
mod manager;
mod record;
mod scheduler;
mod validation;
mod vector_store;

use config::Config;
use log::{error, info};
use manager::MemoryManager;
use scheduler::Scheduler;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("[memoryd] fatal configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let embedding_provider = match embedding::build(&config) {
        Ok(p) => p,
        Err(e) => {
            error!("[memoryd] failed to construct embedding provider: {e}");
            return ExitCode::FAILURE;
        }
    };

    let vector_store = match vector_store::build(&config, embedding_provider.dimensions()).await {
        Ok(s) => s,
        Err(e) => {
            error!("[memoryd] failed to construct vector store: {e}");
            return ExitCode::FAILURE;
        }
    };

    let manager = Arc::new(MemoryManager::new(vector_store, embedding_provider, &config));
    if let Err(e) = manager.bootstrap_cache().await {
        error!("[memoryd] failed to bootstrap working cache: {e}");
        return ExitCode::FAILURE;
    }

    info!("[memoryd] starting gateway (vector_store={:?}, embedding={:?})", config.vector_store_type, config.embedding_provider_type);
    let scheduler = Scheduler::start(Arc::clone(&manager), &config);

    let result = gateway::run(manager).await;
    scheduler.stop().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[memoryd] gateway terminated: {e}");
            ExitCode::FAILURE
        }
    }
}
