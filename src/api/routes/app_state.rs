//! Application state management.
//!
//! Holds the shared storage backend, rule-engine client and advisory lock
//! registry, injected into every route handler.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::{AutomationService, HttpRuleEngineClient, LockRegistry, RuleEngineClient};
use crate::storage::{MemoryStorageBackend, PostgresStorageBackend, StorageBackend, StorageError};

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend (PostgreSQL in production, in-memory for tests)
    pub storage: Arc<dyn StorageBackend>,
    /// Remote rule-engine client
    pub engine: Arc<dyn RuleEngineClient>,
    /// Per-resource advisory locks
    pub locks: Arc<LockRegistry>,
}

impl AppState {
    pub fn new(storage: Arc<dyn StorageBackend>, engine: Arc<dyn RuleEngineClient>) -> Self {
        Self {
            storage,
            engine,
            locks: Arc::new(LockRegistry::new()),
        }
    }

    /// Initialize from environment configuration: PostgreSQL when
    /// `DATABASE_URL` is set (running migrations), in-memory otherwise.
    /// `RULE_ENGINE_URL` points at the remote rule-execution service.
    pub async fn from_env() -> Result<Self, StorageError> {
        let storage: Arc<dyn StorageBackend> = if let Ok(database_url) =
            std::env::var("DATABASE_URL")
        {
            let pool = PgPool::connect(&database_url)
                .await
                .map_err(|e| StorageError::ConnectionError(format!("Failed to connect: {e}")))?;
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(StorageError::ConnectionError(format!(
                    "Migration failed: {e}"
                )));
            }
            Arc::new(PostgresStorageBackend::new(pool))
        } else {
            Arc::new(MemoryStorageBackend::new())
        };

        let engine_url = std::env::var("RULE_ENGINE_URL")
            .unwrap_or_else(|_| "http://localhost:9200".to_string());
        let engine = HttpRuleEngineClient::new(engine_url)
            .map_err(|e| StorageError::Other(format!("Failed to build engine client: {e}")))?;

        Ok(Self::new(storage, Arc::new(engine)))
    }

    /// Build the orchestrator service over the shared state.
    pub fn automation_service(&self) -> AutomationService {
        AutomationService::new(
            self.storage.clone(),
            self.engine.clone(),
            self.locks.clone(),
        )
    }
}
