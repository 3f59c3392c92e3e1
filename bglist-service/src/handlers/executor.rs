//! Filter, count, order and page a catalog collection

use crate::cache::CacheGate;
use crate::catalog::Resource;
use crate::error::Result;
use crate::repository::{CatalogRepository, Page, PageQuery};

use super::query::RequestDto;

/// Runs a validated list request against a repository
///
/// The record count is always read from the store; only the page itself is
/// served from the cache when one is attached.
pub struct QueryExecutor<'a, R: Resource> {
    repository: &'a dyn CatalogRepository<R>,
    cache: Option<&'a CacheGate>,
}

impl<'a, R: Resource> QueryExecutor<'a, R> {
    pub fn new(repository: &'a dyn CatalogRepository<R>) -> Self {
        Self {
            repository,
            cache: None,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: &'a CacheGate) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn execute(&self, request: &RequestDto<R::Schema>) -> Result<Page<R>> {
        let filter = request.name_filter(R::NAME_MATCH);
        let record_count = self.repository.count(filter.as_ref()).await?;

        let query = PageQuery {
            filter,
            column: request.column(),
            direction: request.direction(),
            offset: request.offset(),
            limit: request.limit(),
        };

        let items = match self.cache {
            Some(cache) => {
                let key = request.cache_key()?;
                match cache.get::<Vec<R>>(&key).await? {
                    Some(items) => items,
                    None => {
                        let items = self.repository.fetch_page(&query).await?;
                        cache.set(&key, &items).await?;
                        items
                    }
                }
            }
            None => self.repository.fetch_page(&query).await?,
        };

        tracing::debug!(
            table = R::TABLE,
            record_count,
            returned = items.len(),
            "list query executed"
        );

        Ok(Page {
            items,
            record_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BoardGame, ColumnOf, Mechanic};
    use crate::handlers::RequestParams;
    use crate::repository::{MemoryRepository, NameFilter, RepositoryResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts page fetches so tests can observe cache hits
    struct Counting<R> {
        inner: MemoryRepository<R>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl<R: Resource> CatalogRepository<R> for Counting<R> {
        async fn count(&self, filter: Option<&NameFilter>) -> RepositoryResult<u64> {
            self.inner.count(filter).await
        }

        async fn fetch_page(&self, query: &PageQuery<ColumnOf<R>>) -> RepositoryResult<Vec<R>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_page(query).await
        }

        async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<R>> {
            self.inner.find_by_id(id).await
        }

        async fn update(&self, record: &R) -> RepositoryResult<()> {
            self.inner.update(record).await
        }

        async fn delete(&self, id: i32) -> RepositoryResult<bool> {
            self.inner.delete(id).await
        }
    }

    fn games(count: i32) -> Counting<BoardGame> {
        Counting {
            inner: MemoryRepository::with_records(
                (1..=count).map(|id| BoardGame::new(id, format!("Game {:02}", id))),
            ),
            fetches: AtomicUsize::new(0),
        }
    }

    fn request<T: crate::catalog::FieldSchema>(
        page_index: &str,
        page_size: &str,
        filter: Option<&str>,
    ) -> RequestDto<T> {
        RequestDto::bind(RequestParams {
            page_index: Some(page_index.into()),
            page_size: Some(page_size.into()),
            filter_query: filter.map(String::from),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_pages_and_counts_before_paging() {
        let repo = games(25);
        let page = QueryExecutor::<BoardGame>::new(&repo)
            .execute(&request("2", "10", None))
            .await
            .unwrap();
        assert_eq!(page.record_count, 25);
        let ids: Vec<i32> = page.items.iter().map(|g| g.id).collect();
        assert_eq!(ids, (21..=25).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_prefix_filter_for_board_games() {
        let repo = Counting {
            inner: MemoryRepository::with_records(vec![
                BoardGame::new(1, "Wargames"),
                BoardGame::new(2, "Starwar"),
            ]),
            fetches: AtomicUsize::new(0),
        };
        let page = QueryExecutor::<BoardGame>::new(&repo)
            .execute(&request("0", "10", Some("War")))
            .await
            .unwrap();
        assert_eq!(page.record_count, 1);
        assert_eq!(page.items[0].name, "Wargames");
    }

    #[tokio::test]
    async fn test_substring_filter_for_mechanics() {
        let repo = Counting {
            inner: MemoryRepository::with_records(vec![
                Mechanic::new(1, "Wargames"),
                Mechanic::new(2, "Starwar"),
                Mechanic::new(3, "Dice Rolling"),
            ]),
            fetches: AtomicUsize::new(0),
        };
        let page = QueryExecutor::<Mechanic>::new(&repo)
            .execute(&request("0", "10", Some("war")))
            .await
            .unwrap();
        assert_eq!(page.record_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_page_is_reused_within_ttl() {
        let repo = games(5);
        let cache = CacheGate::in_memory(Duration::from_secs(30));
        let executor = QueryExecutor::<BoardGame>::new(&repo).with_cache(&cache);

        let first = executor.execute(&request("0", "3", None)).await.unwrap();
        repo.inner.delete(1).await.unwrap();
        let second = executor.execute(&request("0", "3", None)).await.unwrap();

        assert_eq!(repo.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(first.items, second.items);
        // the count is never cached
        assert_eq!(second.record_count, 4);

        tokio::time::advance(Duration::from_secs(31)).await;
        let third = executor.execute(&request("0", "3", None)).await.unwrap();
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 2);
        assert_ne!(first.items, third.items);
    }

    #[tokio::test]
    async fn test_distinct_parameters_use_distinct_entries() {
        let repo = games(5);
        let cache = CacheGate::in_memory(Duration::from_secs(30));
        let executor = QueryExecutor::<BoardGame>::new(&repo).with_cache(&cache);

        executor.execute(&request("0", "2", None)).await.unwrap();
        executor.execute(&request("1", "2", None)).await.unwrap();
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 2);
    }
}
