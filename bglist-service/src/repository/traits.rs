//! Catalog repository trait
//!
//! The store is an external collaborator; this trait is the whole of what the
//! request pipeline needs from it. Implementations exist for PostgreSQL
//! (`database` feature) and for an in-process map used by tests and by
//! deployments without a database.

use async_trait::async_trait;

use super::error::RepositoryError;
use super::pagination::{NameFilter, PageQuery};
use crate::catalog::{ColumnOf, Resource};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Collection-query capability for one resource type
///
/// Every method is a single store round trip; writes are committed before
/// they return.
#[async_trait]
pub trait CatalogRepository<R: Resource>: Send + Sync {
    /// Count records whose name satisfies `filter` (all records when `None`)
    async fn count(&self, filter: Option<&NameFilter>) -> RepositoryResult<u64>;

    /// Filter, order by the typed column, then skip/take
    async fn fetch_page(&self, query: &PageQuery<ColumnOf<R>>) -> RepositoryResult<Vec<R>>;

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<R>>;

    /// Persist an already-modified record
    async fn update(&self, record: &R) -> RepositoryResult<()>;

    /// Remove the record with `id`; `false` when nothing was removed
    async fn delete(&self, id: i32) -> RepositoryResult<bool>;
}
