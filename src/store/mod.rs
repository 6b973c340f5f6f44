//! Document storage, standing-query matching and the query language they
//! share.

pub mod memory;
pub mod pagination;
pub mod postgres;
pub mod predicate_index;
pub mod query;
pub mod resource;
pub mod traits;

pub use memory::MemoryDocumentStore;
pub use pagination::{Pagination, SearchHits, SortOrder};
pub use postgres::PostgresDocumentStore;
pub use predicate_index::PredicateIndex;
pub use query::{QueryError, StandingQuery};
pub use resource::{Page, Resource, ResourceStore};
pub use traits::{DocumentStore, Percolator, PredicateId, StoreError};
