pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;
pub mod tx;

use std::sync::Arc;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use store::{DocumentStore, Filter, StoreError, Table, Transaction};
pub use tx::{Document, Tx};

use crate::config::{AppConfig, Environment};

/// Open the configured store: Postgres when `DATABASE_URL` is set, the
/// in-memory store otherwise (development only).
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.database.url.as_deref() {
        Some(url) => {
            let store = PgDocumentStore::connect(url, &config.database).await?;
            if config.database.run_migrations {
                store.migrate().await?;
            }
            Ok(Arc::new(store))
        }
        None if matches!(config.environment, Environment::Development) => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        None => Err(StoreError::ConfigMissing("DATABASE_URL")),
    }
}
