//! Postgres-backed document store.
//!
//! One `documents` table keyed by `(collection, id)` with a `jsonb` body.
//! Every write issues `pg_notify` on [`CHANNEL`] in the same transaction, and
//! `watch` forwards those notifications through a `PgListener` task.
//!
//! ## Error Mapping
//!
//! | SQLx Error                        | StoreError       |
//! |-----------------------------------|------------------|
//! | Database, code `23505`            | `AlreadyExists`  |
//! | anything else                     | `Backend`        |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use sqlx::postgres::{PgListener, PgRow};
use sqlx::{PgPool, Row};
use tokio::sync::mpsc;
use tracing::instrument;

use comanda_events::{Subscription, SubscriptionHandle};

use super::r#trait::{
    ChangeKind, ChangeNotice, Collection, Direction, Document, DocumentStore, OrderBy, Query,
    ServerTimestamp, StoreError,
};

pub const CHANNEL: &str = "comanda_documents";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (collection, id)
)
"#;

#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `documents` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn notify(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        collection: Collection,
        id: &str,
        kind: ChangeKind,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&ChangeNotice {
            collection,
            id: id.to_string(),
            kind,
        })
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANNEL)
            .bind(payload)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("notify", e))?;
        Ok(())
    }
}

fn order_clause(order_by: &OrderBy) -> String {
    let dir = |d: &Direction| match d {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    // Field names are bound as text[] paths; only the direction is inlined.
    match order_by {
        OrderBy::Timestamp { direction, .. } => format!(
            "ORDER BY (data #>> ARRAY[$3, 'seconds'])::BIGINT {d}, (data #>> ARRAY[$3, 'nanos'])::BIGINT {d}",
            d = dir(direction)
        ),
        OrderBy::Text { direction, .. } => {
            // Bytewise, same as the in-memory backend.
            format!("ORDER BY data ->> $3 COLLATE \"C\" {}", dir(direction))
        }
    }
}

fn order_field(order_by: &OrderBy) -> &str {
    match order_by {
        OrderBy::Timestamp { field, .. } | OrderBy::Text { field, .. } => field,
    }
}

fn document_from_row(row: &PgRow) -> Result<Document, StoreError> {
    let read = |e: sqlx::Error| map_sqlx_error("decode_row", e);
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(read)?;
    Ok(Document {
        id: row.try_get("id").map_err(read)?,
        data: row.try_get("data").map_err(read)?,
        created_at: ServerTimestamp::from_datetime(created_at),
        updated_at: ServerTimestamp::from_datetime(updated_at),
    })
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self, data), err)]
    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        data: JsonValue,
    ) -> Result<Document, StoreError> {
        if !data.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            RETURNING id, data, created_at, updated_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(&data)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation(&e) {
                StoreError::AlreadyExists {
                    collection,
                    id: id.to_string(),
                }
            } else {
                map_sqlx_error("insert", e)
            }
        })?;

        Self::notify(&mut tx, collection, id, ChangeKind::Created).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("insert", e))?;

        document_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, data, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(document_from_row).transpose()
    }

    #[instrument(skip(self, query), err)]
    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, StoreError> {
        // $1 collection, $2 filter (jsonb object or NULL), $3 order field.
        let mut sql = String::from(
            r#"
            SELECT id, data, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND ($2::JSONB IS NULL OR data @> $2::JSONB)
            "#,
        );
        match &query.order_by {
            Some(order_by) => sql.push_str(&order_clause(order_by)),
            // Keep $3 referenced so the parameter count is stable.
            None => sql.push_str("AND $3::TEXT IS NULL ORDER BY created_at ASC"),
        }

        let filter = query.filter.as_ref().map(|(field, value)| {
            let mut obj = Map::new();
            obj.insert(field.clone(), value.clone());
            JsonValue::Object(obj)
        });
        let field = query.order_by.as_ref().map(order_field);

        let rows = sqlx::query(&sql)
            .bind(collection.as_str())
            .bind(filter)
            .bind(field)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(document_from_row).collect()
    }

    #[instrument(skip(self, patch), err)]
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, JsonValue>,
    ) -> Result<Document, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        let row = sqlx::query(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            RETURNING id, data, created_at, updated_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(JsonValue::Object(patch))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update", e))?
        .ok_or_else(|| StoreError::NotFound {
            collection,
            id: id.to_string(),
        })?;

        Self::notify(&mut tx, collection, id, ChangeKind::Updated).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("update", e))?;

        document_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        let removed = result.rows_affected() > 0;
        if removed {
            Self::notify(&mut tx, collection, id, ChangeKind::Deleted).await?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("delete", e))?;
        Ok(removed)
    }

    async fn watch(&self, collection: Collection) -> Result<Subscription<ChangeNotice>, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("watch", e))?;
        listener
            .listen(CHANNEL)
            .await
            .map_err(|e| map_sqlx_error("watch", e))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            loop {
                let notification = match listener.recv().await {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::error!(error = %e, %collection, "change listener failed");
                        break;
                    }
                };
                let notice: ChangeNotice = match serde_json::from_str(notification.payload()) {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed change notice");
                        continue;
                    }
                };
                if notice.collection != collection {
                    continue;
                }
                if tx.send(notice).is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, SubscriptionHandle::new(move || task.abort())))
    }
}

fn unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_order_compares_bytewise() {
        let clause = order_clause(&OrderBy::text("name", Direction::Asc));
        assert_eq!(clause, "ORDER BY data ->> $3 COLLATE \"C\" ASC");
    }

    #[test]
    fn timestamp_order_uses_seconds_then_nanos() {
        let clause = order_clause(&OrderBy::timestamp("date", Direction::Desc));
        assert!(clause.contains("'seconds'])::BIGINT DESC"));
        assert!(clause.ends_with("'nanos'])::BIGINT DESC"));
    }
}
