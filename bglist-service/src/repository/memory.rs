//! In-process catalog store

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::pagination::{NameFilter, OrderDirection, PageQuery};
use super::traits::{CatalogRepository, RepositoryResult};
use crate::catalog::{ColumnOf, Resource};

/// Map-backed repository keyed by record id
///
/// Iteration starts in id order and the sort is stable, so records that tie
/// on the sort column come back in id order.
#[derive(Debug, Default)]
pub struct MemoryRepository<R> {
    records: RwLock<BTreeMap<i32, R>>,
}

impl<R: Resource> MemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Repository seeded with `records` (later duplicates of an id win)
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id(), r)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    fn matching<'a>(
        records: &'a BTreeMap<i32, R>,
        filter: Option<&'a NameFilter>,
    ) -> impl Iterator<Item = &'a R> + 'a {
        records
            .values()
            .filter(move |r| filter.map_or(true, |f| f.matches(r.name())))
    }
}

#[async_trait]
impl<R: Resource> CatalogRepository<R> for MemoryRepository<R> {
    async fn count(&self, filter: Option<&NameFilter>) -> RepositoryResult<u64> {
        let records = self.records.read().await;
        Ok(Self::matching(&records, filter).count() as u64)
    }

    async fn fetch_page(&self, query: &PageQuery<ColumnOf<R>>) -> RepositoryResult<Vec<R>> {
        let records = self.records.read().await;
        let mut rows: Vec<&R> = Self::matching(&records, query.filter.as_ref()).collect();

        rows.sort_by(|a, b| {
            let ordering = a.compare_by(b, query.column);
            match query.direction {
                OrderDirection::Ascending => ordering,
                OrderDirection::Descending => ordering.reverse(),
            }
        });

        Ok(rows
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<R>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, record: &R) -> RepositoryResult<()> {
        self.records
            .write()
            .await
            .insert(record.id(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: i32) -> RepositoryResult<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}
