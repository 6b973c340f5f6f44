//! In-process [`DocumentStore`] used when persistence is disabled.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::pagination::{Pagination, SearchHits};
use super::query::{StandingQuery, compare_values};
use super::traits::{DocumentStore, StoreError};

#[derive(Debug, Default)]
struct Collection {
    next_seq: u64,
    docs: HashMap<String, (u64, Value)>,
    order: BTreeMap<u64, String>,
}

impl Collection {
    fn ordered(&self) -> impl Iterator<Item = &Value> {
        self.order
            .values()
            .filter_map(|id| self.docs.get(id).map(|(_, doc)| doc))
    }
}

/// Insertion-ordered document store held entirely in memory.
///
/// Writes are visible as soon as the write lock is released, so
/// [`flush`](DocumentStore::flush) has nothing to do.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_matching<F>(&self, collection: &str, mut keep: F) -> Vec<Value>
    where
        F: FnMut(&Value) -> bool,
    {
        let guard = self.collections.read().await;
        guard
            .get(collection)
            .map(|c| c.ordered().filter(|doc| keep(*doc)).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<bool, StoreError> {
        let mut guard = self.collections.write().await;
        let coll = guard.entry(collection.to_string()).or_default();
        if coll.docs.contains_key(id) {
            return Ok(false);
        }
        coll.next_seq += 1;
        let seq = coll.next_seq;
        coll.docs.insert(id.to_string(), (seq, body));
        coll.order.insert(seq, id.to_string());
        Ok(true)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|c| c.docs.get(id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<bool, StoreError> {
        let mut guard = self.collections.write().await;
        let Some(slot) = guard.get_mut(collection).and_then(|c| c.docs.get_mut(id)) else {
            return Ok(false);
        };
        slot.1 = body;
        Ok(true)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut guard = self.collections.write().await;
        let Some(coll) = guard.get_mut(collection) else {
            return Ok(false);
        };
        match coll.docs.remove(id) {
            Some((seq, _)) => {
                coll.order.remove(&seq);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search_all(
        &self,
        collection: &str,
        pagination: &Pagination,
    ) -> Result<SearchHits, StoreError> {
        let docs = self.collect_matching(collection, |_| true).await;
        Ok(pagination.apply(docs))
    }

    async fn search_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        pagination: &Pagination,
    ) -> Result<SearchHits, StoreError> {
        let docs = self
            .collect_matching(collection, |doc| {
                doc.get(field).is_some_and(|v| {
                    v == value || compare_values(v, value).is_some_and(|o| o.is_eq())
                })
            })
            .await;
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
            .collect_matching(collection, |doc| compiled.matches(doc))
            .await;
        Ok(pagination.apply(docs))
    }

    async fn flush(&self, _collection: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for (id, n) in [("E1", 5), ("E2", 10), ("E3", 5)] {
            let created = store
                .create_document("events", id, json!({"id": id, "n": n}))
                .await;
            assert!(matches!(created, Ok(true)));
        }
        store
    }

    #[tokio::test]
    async fn create_rejects_duplicate_ids() {
        let store = seeded().await;
        let again = store.create_document("events", "E1", json!({})).await;
        assert!(matches!(again, Ok(false)));
        // other collections are independent
        let other = store.create_document("alerts", "E1", json!({})).await;
        assert!(matches!(other, Ok(true)));
    }

    #[tokio::test]
    async fn get_update_delete() {
        let store = seeded().await;
        let Ok(Some(doc)) = store.get_document("events", "E2").await else {
            panic!("E2 should exist");
        };
        assert_eq!(doc["n"], 10);

        assert!(matches!(
            store.update_document("events", "E2", json!({"id": "E2", "n": 11})).await,
            Ok(true)
        ));
        assert!(matches!(
            store.update_document("events", "E9", json!({})).await,
            Ok(false)
        ));

        assert!(matches!(store.delete_document("events", "E2").await, Ok(true)));
        assert!(matches!(store.delete_document("events", "E2").await, Ok(false)));
        assert!(matches!(store.get_document("events", "E2").await, Ok(None)));
        assert!(matches!(store.delete_document("nothing", "E2").await, Ok(false)));
    }

    #[tokio::test]
    async fn search_all_preserves_insertion_order() {
        let store = seeded().await;
        let Ok(hits) = store.search_all("events", &Pagination::all()).await else {
            panic!("search failed");
        };
        let ids: Vec<_> = hits.documents.iter().map(|d| d["id"].clone()).collect();
        assert_eq!(ids, vec![json!("E1"), json!("E2"), json!("E3")]);
        assert_eq!(hits.total, 3);
    }

    #[tokio::test]
    async fn search_by_field_is_exact() {
        let store = seeded().await;
        let Ok(hits) = store
            .search_by_field("events", "n", &json!(5), &Pagination::all())
            .await
        else {
            panic!("search failed");
        };
        assert_eq!(hits.total, 2);

        let Ok(none) = store
            .search_by_field("events", "n", &json!("5"), &Pagination::all())
            .await
        else {
            panic!("search failed");
        };
        assert_eq!(none.total, 0);
    }

    #[tokio::test]
    async fn search_by_query_uses_dsl() {
        let store = seeded().await;
        let query = json!({"query": {"range": {"n": {"gt": 6}}}});
        let Ok(hits) = store
            .search_by_query("events", &query, &Pagination::all())
            .await
        else {
            panic!("search failed");
        };
        assert_eq!(hits.total, 1);
        assert_eq!(hits.documents.first().map(|d| &d["id"]), Some(&json!("E2")));

        let bad = store
            .search_by_query("events", &json!({"nope": {}}), &Pagination::all())
            .await;
        assert!(matches!(bad, Err(StoreError::InvalidQuery(_))));
    }
}
