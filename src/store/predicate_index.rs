//! Embedded matching service: an inverted index over standing queries.
//!
//! [`PredicateIndex`] groups standing queries by scope and indexes each one
//! under its anchor terms (see [`StandingQuery`]). To match a document it
//! looks up the document's own terms, unions the predicates found there with
//! the scope's unanchored set, and evaluates only those candidates. For
//! term-shaped trigger conditions the work done per event is proportional
//! to the number of triggers that share a term with it, not to the number
//! of triggers registered.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::query::{StandingQuery, TermKey, document_terms};
use super::traits::{Percolator, PredicateId, StoreError};

#[derive(Debug)]
struct Entry {
    scope: String,
    query: StandingQuery,
    anchors: Option<Vec<TermKey>>,
    seq: u64,
}

#[derive(Debug, Default)]
struct ScopeIndex {
    by_term: HashMap<TermKey, HashSet<PredicateId>>,
    unanchored: HashSet<PredicateId>,
}

impl ScopeIndex {
    fn is_empty(&self) -> bool {
        self.by_term.is_empty() && self.unanchored.is_empty()
    }
}

#[derive(Debug, Default)]
struct IndexState {
    next_seq: u64,
    scopes: HashMap<String, ScopeIndex>,
    entries: HashMap<PredicateId, Entry>,
}

impl IndexState {
    fn insert(&mut self, id: PredicateId, scope: &str, query: StandingQuery) {
        self.remove(id);

        let anchors = query.anchors();
        let index = self.scopes.entry(scope.to_string()).or_default();
        match &anchors {
            Some(keys) => {
                for key in keys {
                    index.by_term.entry(key.clone()).or_default().insert(id);
                }
            }
            None => {
                index.unanchored.insert(id);
            }
        }

        self.next_seq += 1;
        self.entries.insert(
            id,
            Entry {
                scope: scope.to_string(),
                query,
                anchors,
                seq: self.next_seq,
            },
        );
    }

    fn remove(&mut self, id: PredicateId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        if let Some(index) = self.scopes.get_mut(&entry.scope) {
            match &entry.anchors {
                Some(keys) => {
                    for key in keys {
                        if let Some(ids) = index.by_term.get_mut(key) {
                            ids.remove(&id);
                            if ids.is_empty() {
                                index.by_term.remove(key);
                            }
                        }
                    }
                }
                None => {
                    index.unanchored.remove(&id);
                }
            }
            if index.is_empty() {
                self.scopes.remove(&entry.scope);
            }
        }
        true
    }

    fn matching(&self, scope: &str, document: &Value) -> Vec<PredicateId> {
        let Some(index) = self.scopes.get(scope) else {
            return Vec::new();
        };

        let mut candidates: HashSet<PredicateId> = index.unanchored.clone();
        for term in document_terms(document) {
            if let Some(ids) = index.by_term.get(&term) {
                candidates.extend(ids);
            }
        }

        let mut hits: Vec<(u64, PredicateId)> = candidates
            .into_iter()
            .filter_map(|id| {
                let entry = self.entries.get(&id)?;
                entry.query.matches(document).then_some((entry.seq, id))
            })
            .collect();
        hits.sort_unstable_by_key(|(seq, _)| *seq);
        hits.into_iter().map(|(_, id)| id).collect()
    }
}

/// In-process [`Percolator`] backed by an inverted term index.
///
/// Matching holds the read lock for the whole evaluation, so a concurrent
/// deregistration is either fully visible to a match or not at all.
#[derive(Debug, Default)]
pub struct PredicateIndex {
    state: RwLock<IndexState>,
}

impl PredicateIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered standing queries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

#[async_trait]
impl Percolator for PredicateIndex {
    async fn register_standing_query(
        &self,
        scope: &str,
        query: &Value,
    ) -> Result<PredicateId, StoreError> {
        let compiled = StandingQuery::compile(query)?;
        let id = PredicateId::new();
        self.state.write().await.insert(id, scope, compiled);
        tracing::debug!(predicate_id = %id, scope, "standing query registered");
        Ok(id)
    }

    async fn restore_standing_query(
        &self,
        scope: &str,
        id: PredicateId,
        query: &Value,
    ) -> Result<(), StoreError> {
        let compiled = StandingQuery::compile(query)?;
        self.state.write().await.insert(id, scope, compiled);
        Ok(())
    }

    async fn deregister_standing_query(&self, id: PredicateId) -> Result<bool, StoreError> {
        let removed = self.state.write().await.remove(id);
        if removed {
            tracing::debug!(predicate_id = %id, "standing query deregistered");
        }
        Ok(removed)
    }

    async fn match_document(
        &self,
        scope: &str,
        document: &Value,
    ) -> Result<Vec<PredicateId>, StoreError> {
        Ok(self.state.read().await.matching(scope, document))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn register(index: &PredicateIndex, scope: &str, query: Value) -> PredicateId {
        let Ok(id) = index.register_standing_query(scope, &query).await else {
            panic!("query should compile: {query}");
        };
        id
    }

    async fn matches(index: &PredicateIndex, scope: &str, doc: Value) -> Vec<PredicateId> {
        let Ok(ids) = index.match_document(scope, &doc).await else {
            panic!("match failed");
        };
        ids
    }

    #[tokio::test]
    async fn returns_only_satisfied_predicates_in_registration_order() {
        let index = PredicateIndex::new();
        let hot = register(&index, "ET1", json!({"range": {"reading": {"gte": 90}}})).await;
        let exact = register(&index, "ET1", json!({"term": {"reading": 100}})).await;
        let cold = register(&index, "ET1", json!({"term": {"reading": 0}})).await;

        assert_eq!(matches(&index, "ET1", json!({"reading": 100})).await, vec![hot, exact]);
        assert_eq!(matches(&index, "ET1", json!({"reading": 0})).await, vec![cold]);
        assert!(matches(&index, "ET1", json!({"reading": 50})).await.is_empty());
    }

    #[tokio::test]
    async fn negative_zero_reaches_zero_predicates() {
        let index = PredicateIndex::new();
        let zero = register(&index, "ET1", json!({"term": {"x": 0}})).await;
        let float_zero = register(&index, "ET1", json!({"term": {"x": -0.0}})).await;

        assert_eq!(matches(&index, "ET1", json!({"x": -0.0})).await, vec![zero, float_zero]);
        assert_eq!(matches(&index, "ET1", json!({"x": 0})).await, vec![zero, float_zero]);
    }

    #[tokio::test]
    async fn numeric_match_text_reaches_number_documents() {
        let index = PredicateIndex::new();
        let id = register(&index, "ET1", json!({"match": {"reading": "100"}})).await;
        assert_eq!(matches(&index, "ET1", json!({"reading": 100})).await, vec![id]);
        assert!(matches(&index, "ET1", json!({"reading": 10})).await.is_empty());
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let index = PredicateIndex::new();
        let _ = register(&index, "ET1", json!({"term": {"reading": 100}})).await;
        assert!(matches(&index, "ET2", json!({"reading": 100})).await.is_empty());
    }

    #[tokio::test]
    async fn deregister_stops_matching() {
        let index = PredicateIndex::new();
        let id = register(&index, "ET1", json!({"match": {"msg": "disk full"}})).await;
        assert_eq!(matches(&index, "ET1", json!({"msg": "Disk is FULL"})).await, vec![id]);

        assert!(matches!(index.deregister_standing_query(id).await, Ok(true)));
        assert!(matches!(index.deregister_standing_query(id).await, Ok(false)));
        assert!(matches(&index, "ET1", json!({"msg": "disk full"})).await.is_empty());
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn restore_keeps_the_handle() {
        let index = PredicateIndex::new();
        let id = PredicateId::new();
        let Ok(()) = index
            .restore_standing_query("ET1", id, &json!({"exists": {"field": "host"}}))
            .await
        else {
            panic!("restore failed");
        };
        assert_eq!(matches(&index, "ET1", json!({"host": "a"})).await, vec![id]);

        // restoring again replaces rather than duplicates
        let Ok(()) = index
            .restore_standing_query("ET1", id, &json!({"term": {"host": "b"}}))
            .await
        else {
            panic!("restore failed");
        };
        assert!(matches(&index, "ET1", json!({"host": "a"})).await.is_empty());
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn unanchored_queries_are_still_evaluated() {
        let index = PredicateIndex::new();
        let not_ok = register(
            &index,
            "ET1",
            json!({"bool": {"must_not": [{"term": {"status": "ok"}}]}}),
        )
        .await;
        assert_eq!(matches(&index, "ET1", json!({"status": "down"})).await, vec![not_ok]);
        assert!(matches(&index, "ET1", json!({"status": "ok"})).await.is_empty());
    }

    #[tokio::test]
    async fn invalid_query_is_rejected() {
        let index = PredicateIndex::new();
        let result = index
            .register_standing_query("ET1", &json!({"percolate": {}}))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidQuery(_))));
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn many_triggers_match_only_their_term() {
        let index = PredicateIndex::new();
        let mut ids = Vec::new();
        for n in 0..200 {
            ids.push(register(&index, "ET1", json!({"term": {"code": n}})).await);
        }
        let hit = matches(&index, "ET1", json!({"code": 137})).await;
        assert_eq!(hit, ids.get(137).copied().into_iter().collect::<Vec<_>>());
    }
}
