//! Seams to the indexed-document and standing-query services.
//!
//! The engine never talks to a backend directly. Every read and write goes
//! through a [`DocumentStore`], and every condition evaluation goes through
//! a [`Percolator`]. Both are object safe so the application state can hold
//! `Arc<dyn ...>` and swap backends at startup.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::pagination::{Pagination, SearchHits};
use super::query::QueryError;

/// Faults reported by a document store or matching service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    #[error("backend failure: {0}")]
    Backend(String),

    /// A stored document could not be encoded or decoded.
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A raw query or standing query did not compile.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Handle of a standing query registered with a [`Percolator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PredicateId(Uuid);

impl PredicateId {
    /// Generates a fresh random handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PredicateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collection-oriented document storage with search.
///
/// Writes must be visible to every caller once [`flush`](Self::flush)
/// returns.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Inserts `body` under `id`. Returns `false` without writing if the id
    /// is already taken.
    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<bool, StoreError>;

    /// Fetches a document by id.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces an existing document. Returns `false` if it does not exist.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<bool, StoreError>;

    /// Removes a document. Returns `false` if it was not there.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Lists a page of the collection.
    async fn search_all(
        &self,
        collection: &str,
        pagination: &Pagination,
    ) -> Result<SearchHits, StoreError>;

    /// Lists documents whose top-level `field` equals `value` exactly.
    async fn search_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        pagination: &Pagination,
    ) -> Result<SearchHits, StoreError>;

    /// Lists documents matching a raw query in the standing-query DSL.
    async fn search_by_query(
        &self,
        collection: &str,
        query: &Value,
        pagination: &Pagination,
    ) -> Result<SearchHits, StoreError>;

    /// Blocks until prior writes to `collection` are visible.
    async fn flush(&self, collection: &str) -> Result<(), StoreError>;
}

/// Standing-query registration and one-document-against-many matching.
#[async_trait]
pub trait Percolator: Send + Sync + fmt::Debug {
    /// Compiles and registers `query` under `scope`, returning a new handle.
    async fn register_standing_query(
        &self,
        scope: &str,
        query: &Value,
    ) -> Result<PredicateId, StoreError>;

    /// Registers `query` under a handle issued earlier, replacing any
    /// registration that handle already has.
    async fn restore_standing_query(
        &self,
        scope: &str,
        id: PredicateId,
        query: &Value,
    ) -> Result<(), StoreError>;

    /// Removes a registration. Returns `false` if the handle was unknown.
    async fn deregister_standing_query(&self, id: PredicateId) -> Result<bool, StoreError>;

    /// Returns every standing query in `scope` that `document` satisfies,
    /// in registration order.
    async fn match_document(
        &self,
        scope: &str,
        document: &Value,
    ) -> Result<Vec<PredicateId>, StoreError>;
}
