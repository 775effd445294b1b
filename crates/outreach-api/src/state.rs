//! Application state wiring the engine together.
//!
//! AppState holds the concrete engine instance used by both CLI and REST API.
//! The engine is generic over capability provider and repository traits, but
//! AppState pins it to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use outreach_core::pipeline::checkpoint::CheckpointManager;
use outreach_core::pipeline::engine::Engine;
use outreach_infra::capability::CapabilityBackend;
use outreach_infra::config::{load_config, resolve_data_dir};
use outreach_infra::sqlite::pool::DatabasePool;
use outreach_infra::sqlite::run::SqliteRunRepository;

/// Concrete engine type pinned to the infra implementations.
pub type ConcreteEngine = Engine<CapabilityBackend, SqliteRunRepository>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteEngine>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    /// Brief applied to runs that do not supply their own.
    pub default_brief: String,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire
    /// the engine.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("outreach.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;
        tracing::debug!(data_dir = %data_dir.display(), "database ready");

        let repo = SqliteRunRepository::new(db_pool.clone());
        let caps = CapabilityBackend::from_config(&config.capabilities)?;
        let engine = Engine::new(caps, CheckpointManager::new(repo));

        Ok(Self {
            engine: Arc::new(engine),
            data_dir,
            db_pool,
            default_brief: config.default_brief,
        })
    }
}
