use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::store::{DocumentStore, Filter, StoreError, Table, Transaction};

/// Schema for the document table. Each statement runs on its own so the list
/// can be replayed safely on every start.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        seq         BIGSERIAL,
        table_name  TEXT NOT NULL,
        id          UUID NOT NULL,
        body        JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (table_name, id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_body_idx ON documents USING GIN (body jsonb_path_ops)",
    "CREATE INDEX IF NOT EXISTS documents_seq_idx ON documents (table_name, seq)",
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS users_external_id_key
        ON documents ((body->>'external_id'))
        WHERE table_name = 'users'
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS event_registrations_user_event_key
        ON documents ((body->>'user_id'), (body->'event'))
        WHERE table_name = 'event_registrations'
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS attendance_student_class_date_key
        ON documents ((body->>'student_id'), (body->>'class_id'), (body->>'date'))
        WHERE table_name = 'attendance'
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS students_in_classes_key
        ON documents ((body->>'student_id'), (body->>'class_id'))
        WHERE table_name = 'students_in_classes'
    "#,
];

/// Postgres-backed document store. Every transaction is SERIALIZABLE, so
/// read-then-write sequences either commit as if run alone or fail with
/// `StoreError::Conflict`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", redact(url));
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the document table and its indexes
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Document schema is up to date");
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

/// Strip credentials before a connection string reaches the logs
fn redact(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.into()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgTransaction { tx: Some(tx) }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

struct PgTransaction {
    tx: Option<sqlx::Transaction<'static, Postgres>>,
}

impl PgTransaction {
    fn conn(&mut self) -> Result<&mut sqlx::Transaction<'static, Postgres>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::Finished)
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn get(&mut self, table: Table, id: Uuid) -> Result<Option<Value>, StoreError> {
        let conn = self.conn()?;
        let row = sqlx::query("SELECT body FROM documents WHERE table_name = $1 AND id = $2")
            .bind(table.name())
            .bind(id)
            .fetch_optional(&mut **conn)
            .await?;

        match row {
            Some(row) => {
                let Json(body): Json<Value> = row.try_get("body")?;
                Ok(Some(body))
            }
            None => Ok(None),
        }
    }

    async fn query(&mut self, table: Table, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let limit = filter.limit.map(|n| n as i64);
        let conn = self.conn()?;
        let rows = sqlx::query(
            r#"
            SELECT body FROM documents
            WHERE table_name = $1 AND body @> $2
            ORDER BY seq
            LIMIT $3
            "#,
        )
        .bind(table.name())
        .bind(Json(filter.as_json()))
        .bind(limit)
        .fetch_all(&mut **conn)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<Value, StoreError> {
                let Json(body): Json<Value> = row.try_get("body")?;
                Ok(body)
            })
            .collect()
    }

    async fn insert(&mut self, table: Table, id: Uuid, body: Value) -> Result<(), StoreError> {
        let conn = self.conn()?;
        sqlx::query("INSERT INTO documents (table_name, id, body) VALUES ($1, $2, $3)")
            .bind(table.name())
            .bind(id)
            .bind(Json(body))
            .execute(&mut **conn)
            .await?;
        Ok(())
    }

    async fn replace(&mut self, table: Table, id: Uuid, body: Value) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let result = sqlx::query(
            "UPDATE documents SET body = $3, updated_at = now() WHERE table_name = $1 AND id = $2",
        )
        .bind(table.name())
        .bind(id)
        .bind(Json(body))
        .execute(&mut **conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                table: table.name(),
                id,
            });
        }
        Ok(())
    }

    async fn delete(&mut self, table: Table, id: Uuid) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let result = sqlx::query("DELETE FROM documents WHERE table_name = $1 AND id = $2")
            .bind(table.name())
            .bind(id)
            .execute(&mut **conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.commit().await?;
        Ok(())
    }
}
