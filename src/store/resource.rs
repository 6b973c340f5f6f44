//! Typed access to one collection of a [`DocumentStore`].
//!
//! [`ResourceStore`] is the layer every domain registry is built on. It
//! serializes resources to documents, flushes after every mutation so the
//! next read sees the write, and converts store faults into
//! [`WorkflowError`]s, logging each with the operation, collection and id.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::pagination::{Pagination, SearchHits};
use super::traits::{DocumentStore, StoreError};
use crate::domain::{Ident, IdentKind};
use crate::error::WorkflowError;

/// A type stored as one document per instance in a named collection.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Identifier namespace of the resource.
    const KIND: IdentKind;
    /// Collection the documents live in.
    const COLLECTION: &'static str;

    /// Identifier the document is keyed by.
    fn id(&self) -> &Ident;
}

/// One page of typed resources.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Resources on the requested page.
    pub items: Vec<T>,
    /// Number of resources matching, across all pages.
    pub total: u64,
}

/// Typed create/read/list/delete over a single collection.
pub struct ResourceStore<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceStore<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Resource> fmt::Debug for ResourceStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStore")
            .field("collection", &T::COLLECTION)
            .field("store", &self.store)
            .finish()
    }
}

impl<T: Resource> ResourceStore<T> {
    /// Binds `T`'s collection on `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Persists a new resource.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Conflict`] if the id is taken, or
    /// [`WorkflowError::Dependency`] on store failure.
    pub async fn create(&self, item: &T) -> Result<(), WorkflowError> {
        let id = item.id();
        let body = serde_json::to_value(item)
            .map_err(|e| self.fault("create", id.as_str(), StoreError::from(e)))?;
        let created = self
            .store
            .create_document(T::COLLECTION, id.as_str(), body)
            .await
            .map_err(|e| self.fault("create", id.as_str(), e))?;
        if !created {
            return Err(WorkflowError::Conflict(format!("{} {id} already exists", T::KIND)));
        }
        self.flush("create", id.as_str()).await
    }

    /// Fetches a resource, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure or if the
    /// stored document cannot be decoded.
    pub async fn get(&self, id: &Ident) -> Result<Option<T>, WorkflowError> {
        let doc = self
            .store
            .get_document(T::COLLECTION, id.as_str())
            .await
            .map_err(|e| self.fault("get", id.as_str(), e))?;
        doc.map(|doc| self.decode("get", doc)).transpose()
    }

    /// Fetches a resource that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if it is absent, or
    /// [`WorkflowError::Dependency`] on store failure.
    pub async fn get_required(&self, id: &Ident) -> Result<T, WorkflowError> {
        self.get(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(T::KIND, id))
    }

    /// Lists a page of the collection.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn list(&self, pagination: &Pagination) -> Result<Page<T>, WorkflowError> {
        let hits = self
            .store
            .search_all(T::COLLECTION, pagination)
            .await
            .map_err(|e| self.fault("list", "*", e))?;
        self.decode_page("list", hits)
    }

    /// Lists resources whose `field` equals `value` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn search_by_field(
        &self,
        field: &str,
        value: &Value,
        pagination: &Pagination,
    ) -> Result<Page<T>, WorkflowError> {
        let hits = self
            .store
            .search_by_field(T::COLLECTION, field, value, pagination)
            .await
            .map_err(|e| self.fault("search by field", field, e))?;
        self.decode_page("search by field", hits)
    }

    /// Lists resources matching a raw query.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidQuery`] if the query does not
    /// compile, or [`WorkflowError::Dependency`] on store failure.
    pub async fn search_by_query(
        &self,
        query: &Value,
        pagination: &Pagination,
    ) -> Result<Page<T>, WorkflowError> {
        let hits = self
            .store
            .search_by_query(T::COLLECTION, query, pagination)
            .await
            .map_err(|e| self.fault("search by query", "*", e))?;
        self.decode_page("search by query", hits)
    }

    /// Replaces a stored resource. Returns `false` if it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn update(&self, item: &T) -> Result<bool, WorkflowError> {
        let id = item.id();
        let body = serde_json::to_value(item)
            .map_err(|e| self.fault("update", id.as_str(), StoreError::from(e)))?;
        let found = self
            .store
            .update_document(T::COLLECTION, id.as_str(), body)
            .await
            .map_err(|e| self.fault("update", id.as_str(), e))?;
        if found {
            self.flush("update", id.as_str()).await?;
        }
        Ok(found)
    }

    /// Deletes a resource. Returns `false` if it was not there.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Dependency`] on store failure.
    pub async fn delete(&self, id: &Ident) -> Result<bool, WorkflowError> {
        let found = self
            .store
            .delete_document(T::COLLECTION, id.as_str())
            .await
            .map_err(|e| self.fault("delete", id.as_str(), e))?;
        if found {
            self.flush("delete", id.as_str()).await?;
        }
        Ok(found)
    }

    async fn flush(&self, operation: &'static str, id: &str) -> Result<(), WorkflowError> {
        self.store
            .flush(T::COLLECTION)
            .await
            .map_err(|e| self.fault(operation, id, e))
    }

    fn decode(&self, operation: &'static str, doc: Value) -> Result<T, WorkflowError> {
        serde_json::from_value(doc).map_err(|e| self.fault(operation, "*", StoreError::from(e)))
    }

    fn decode_page(&self, operation: &'static str, hits: SearchHits) -> Result<Page<T>, WorkflowError> {
        let items = hits
            .documents
            .into_iter()
            .map(|doc| self.decode(operation, doc))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total: hits.total,
        })
    }

    fn fault(&self, operation: &'static str, id: &str, err: StoreError) -> WorkflowError {
        if !matches!(err, StoreError::InvalidQuery(_)) {
            tracing::error!(
                operation,
                collection = T::COLLECTION,
                id,
                error = %err,
                "document store failure"
            );
        }
        WorkflowError::dependency(operation, err)
    }
}
