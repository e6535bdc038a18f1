pub mod filter;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

use std::sync::Arc;

use tracing::warn;

pub use filter::FilterData;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{Document, Repository, Versioned};
pub use store::{DocumentStore, StoreError, StoredDocument};

use crate::config::DatabaseConfig;
use crate::models::{Profile, User};

/// Unique keys the application relies on, as (collection, field).
const UNIQUE_FIELDS: &[(&str, &str)] = &[
    (<User as Document>::COLLECTION, "email"),
    (<Profile as Document>::COLLECTION, "user"),
];

/// In-memory store with the application's unique keys applied.
pub fn memory_store() -> Arc<dyn DocumentStore> {
    let store = UNIQUE_FIELDS
        .iter()
        .fold(MemoryStore::new(), |store, (collection, field)| store.with_unique_field(collection, field));
    Arc::new(store)
}

/// Connect to Postgres when a database URL is configured, otherwise fall back
/// to the in-memory store.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    if config.url.is_none() {
        warn!("DATABASE_URL not set; using in-memory document store (data is lost on restart)");
        return Ok(memory_store());
    }

    let store = PgStore::connect(config).await?;
    for (collection, field) in UNIQUE_FIELDS {
        store.ensure_unique(collection, field).await?;
    }
    Ok(Arc::new(store))
}
