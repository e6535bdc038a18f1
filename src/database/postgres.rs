use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::info;
use uuid::Uuid;

use super::filter::FilterData;
use super::store::{DocumentStore, StoreError, StoredDocument};
use crate::config::DatabaseConfig;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        seq        BIGSERIAL,
        collection TEXT NOT NULL,
        id         UUID NOT NULL,
        version    BIGINT NOT NULL DEFAULT 1,
        body       JSONB NOT NULL,
        PRIMARY KEY (collection, id)
    )
"#;

const SELECT_COLUMNS: &str = "id, version, body";

/// PostgreSQL document store. Each document is one JSONB row in `documents`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::ConnectionError("DATABASE_URL is not set".to_string()))?;

        // Validate early so a typo surfaces as a config problem, not a driver error
        url::Url::parse(url).map_err(|_| StoreError::ConnectionError("Invalid database URL".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        info!("Connected document store to PostgreSQL");
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS documents_body_idx ON documents USING GIN (body jsonb_path_ops)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Add a partial unique index on a top-level field of one collection.
    pub async fn ensure_unique(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        if !is_safe_identifier(collection) || !is_safe_identifier(field) {
            return Err(StoreError::QueryError(format!("invalid unique key {}.{}", collection, field)));
        }
        let query = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS documents_{c}_{f}_key ON documents ((body->>'{f}')) WHERE collection = '{c}'",
            c = collection,
            f = field
        );
        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<StoredDocument, StoreError> {
        Ok(StoredDocument {
            id: row.try_get("id")?,
            version: row.try_get("version")?,
            body: row.try_get("body")?,
        })
    }
}

fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn map_write_error(err: sqlx::Error, what: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(what),
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
        let query = format!("SELECT {} FROM documents WHERE collection = $1 AND id = $2", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn find_one(&self, collection: &str, filter: &FilterData) -> Result<Option<StoredDocument>, StoreError> {
        let query = format!(
            "SELECT {} FROM documents WHERE collection = $1 AND body @> $2 ORDER BY seq LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(collection)
            .bind(filter.to_json())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn find_all(&self, collection: &str, filter: &FilterData) -> Result<Vec<StoredDocument>, StoreError> {
        let query = format!(
            "SELECT {} FROM documents WHERE collection = $1 AND body @> $2 ORDER BY seq",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(collection)
            .bind(filter.to_json())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_document).collect()
    }

    async fn insert(&self, collection: &str, id: Uuid, body: Value) -> Result<StoredDocument, StoreError> {
        let query = format!(
            "INSERT INTO documents (collection, id, version, body) VALUES ($1, $2, 1, $3) RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(collection)
            .bind(id)
            .bind(&body)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, format!("{} {} conflicts with an existing document", collection, id)))?;
        Self::row_to_document(&row)
    }

    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        expected_version: i64,
        body: Value,
    ) -> Result<StoredDocument, StoreError> {
        let query = format!(
            "UPDATE documents SET body = $4, version = version + 1 \
             WHERE collection = $1 AND id = $2 AND version = $3 RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(collection)
            .bind(id)
            .bind(expected_version)
            .bind(&body)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, format!("{} {} conflicts with an existing document", collection, id)))?;

        match row {
            Some(row) => Self::row_to_document(&row),
            // Either the row is gone or its version moved on
            None => match self.find_by_id(collection, id).await? {
                Some(current) => Err(StoreError::Conflict(format!(
                    "{} {} is at version {}, expected {}",
                    collection, id, current.version, expected_version
                ))),
                None => Err(StoreError::NotFound(format!("{} {}", collection, id))),
            },
        }
    }

    async fn remove(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_where(&self, collection: &str, filter: &FilterData) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND body @> $2")
            .bind(collection)
            .bind(filter.to_json())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
