//! PostgreSQL implementation of [`DocumentStore`].
//!
//! All collections share one `documents` table keyed by
//! `(collection, id)`. The `seq` column gives insertion order. Queries in
//! the standing-query language are compiled once and evaluated in process
//! over the collection's rows; plain listings page in SQL.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::pagination::{Pagination, SearchHits, SortOrder};
use super::query::StandingQuery;
use super::traits::{DocumentStore, StoreError};
use crate::config::WorkflowConfig;

/// PostgreSQL-backed document store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from the configured database settings and applies
    /// pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the database is unreachable or a
    /// migration fails.
    pub async fn connect(config: &WorkflowConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self::new(pool))
    }

    async fn fetch_ordered(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query_scalar::<_, Value>(
            "SELECT body FROM documents WHERE collection = $1 ORDER BY seq ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(collection)
        .bind(id)
        .bind(&body)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query_scalar::<_, Value>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET body = $3, updated_at = now() \
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(&body)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_all(
        &self,
        collection: &str,
        pagination: &Pagination,
    ) -> Result<SearchHits, StoreError> {
        if pagination.sort_by.is_some() {
            let docs = self.fetch_ordered(collection).await?;
            return Ok(pagination.apply(docs));
        }

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents WHERE collection = $1")
                .bind(collection)
                .fetch_one(&self.pool)
                .await?;

        let sql = match pagination.order {
            SortOrder::Asc => {
                "SELECT body FROM documents WHERE collection = $1 \
                 ORDER BY seq ASC LIMIT $2 OFFSET $3"
            }
            SortOrder::Desc => {
                "SELECT body FROM documents WHERE collection = $1 \
                 ORDER BY seq DESC LIMIT $2 OFFSET $3"
            }
        };
        let documents = sqlx::query_scalar::<_, Value>(sql)
            .bind(collection)
            .bind(i64::try_from(pagination.limit()).unwrap_or(i64::MAX))
            .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(SearchHits {
            documents,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn search_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        pagination: &Pagination,
    ) -> Result<SearchHits, StoreError> {
        let docs = sqlx::query_scalar::<_, Value>(
            "SELECT body FROM documents WHERE collection = $1 AND body -> $2 = $3 \
             ORDER BY seq ASC",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        Ok(pagination.apply(docs))
    }

    async fn search_by_query(
        &self,
        collection: &str,
        query: &Value,
        pagination: &Pagination,
    ) -> Result<SearchHits, StoreError> {
        let compiled = StandingQuery::compile(query)?;
        let docs = self
            .fetch_ordered(collection)
            .await?
            .into_iter()
            .filter(|doc| compiled.matches(doc))
            .collect();
        Ok(pagination.apply(docs))
    }

    async fn flush(&self, _collection: &str) -> Result<(), StoreError> {
        // every statement runs in its own committed transaction
        Ok(())
    }
}
