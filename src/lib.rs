pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod legacy;
pub mod models;
pub mod normalize;
pub mod storage;
pub mod store;

pub use crate::config::TrackerConfig;
pub use crate::db::Database;
pub use crate::engine::derive;
pub use crate::errors::{AppError, AppResult};
pub use crate::models::{Calculations, KpiPatch, KpiRecord, RevenueTier};
pub use crate::storage::{KeyValueStorage, MemoryStorage};
pub use crate::store::{KpiStore, SubscriptionId};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub fn bootstrap(data_dir: &Path) -> AppResult<KpiStore<Database>> {
    std::fs::create_dir_all(data_dir)?;
    let config = TrackerConfig::load(data_dir)?;

    if let Err(error) = init_tracing(data_dir, &config) {
        tracing::debug!(error = %error, "tracing already initialized; keeping existing subscriber");
    }

    let database = Database::new(&data_dir.join(&config.database_file))?;
    tracing::info!(path = %database.path().display(), "kpi database ready");

    Ok(KpiStore::open(database, config.storage_key))
}

pub fn init_tracing(data_dir: &Path, config: &TrackerConfig) -> AppResult<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, &config.log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))?;

    let _ = LOG_GUARD.set(guard);
    Ok(())
}
