//! PostgreSQL catalog repository
//!
//! Statements are assembled with [`QueryBuilder`]. Table and column
//! identifiers come from [`Resource::TABLE`] and the typed sort column;
//! every caller-provided value is bound as a parameter.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::marker::PhantomData;

use super::error::{RepositoryError, RepositoryOperation};
use super::pagination::{NameFilter, PageQuery};
use super::traits::{CatalogRepository, RepositoryResult};
use crate::catalog::{BoardGame, ColumnOf, Domain, Mechanic, Resource, SortColumn};

/// A catalog record that maps onto a PostgreSQL table
pub trait PgRecord: Resource + for<'r> FromRow<'r, PgRow> + Unpin {
    /// Append the `SET` assignments for every mutable column
    fn push_assignments(&self, builder: &mut QueryBuilder<'static, Postgres>);
}

impl PgRecord for BoardGame {
    fn push_assignments(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        let mut set = builder.separated(", ");
        set.push("\"Name\" = ").push_bind_unseparated(self.name.clone());
        set.push("\"Year\" = ").push_bind_unseparated(self.year);
        set.push("\"MinPlayers\" = ").push_bind_unseparated(self.min_players);
        set.push("\"MaxPlayers\" = ").push_bind_unseparated(self.max_players);
        set.push("\"PlayTime\" = ").push_bind_unseparated(self.play_time);
        set.push("\"MinAge\" = ").push_bind_unseparated(self.min_age);
        set.push("\"LastModifiedDate\" = ")
            .push_bind_unseparated(self.last_modified_date);
    }
}

impl PgRecord for Domain {
    fn push_assignments(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        let mut set = builder.separated(", ");
        set.push("\"Name\" = ").push_bind_unseparated(self.name.clone());
        set.push("\"LastModifiedDate\" = ")
            .push_bind_unseparated(self.last_modified_date);
    }
}

impl PgRecord for Mechanic {
    fn push_assignments(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        let mut set = builder.separated(", ");
        set.push("\"Name\" = ").push_bind_unseparated(self.name.clone());
        set.push("\"LastModifiedDate\" = ")
            .push_bind_unseparated(self.last_modified_date);
    }
}

/// Table-per-resource repository over a shared pool
#[derive(Debug)]
pub struct PgCatalogRepository<R> {
    pool: PgPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PgCatalogRepository<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: PgRecord> PgCatalogRepository<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    fn fail(operation: RepositoryOperation) -> impl FnOnce(sqlx::Error) -> RepositoryError {
        move |err| RepositoryError::from_sqlx(operation, err).on_table(R::TABLE)
    }
}

fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: Option<&NameFilter>) {
    if let Some(filter) = filter {
        builder
            .push(" WHERE \"Name\" ILIKE ")
            .push_bind(filter.like_pattern())
            .push(" ESCAPE '\\'");
    }
}

fn count_statement<R: Resource>(filter: Option<&NameFilter>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM \"{}\"", R::TABLE));
    push_filter(&mut builder, filter);
    builder
}

fn page_statement<R: Resource>(query: &PageQuery<ColumnOf<R>>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT * FROM \"{}\"", R::TABLE));
    push_filter(&mut builder, query.filter.as_ref());
    builder.push(format!(
        " ORDER BY {} {}, \"Id\" ASC",
        order_expression(query.column.field_name()),
        query.direction.as_sql()
    ));
    builder
        .push(" LIMIT ")
        .push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
        .push(" OFFSET ")
        .push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));
    builder
}

/// Names order case-insensitively, like the in-memory store
fn order_expression(field: &str) -> String {
    if field == "Name" {
        "LOWER(\"Name\")".to_string()
    } else {
        format!("\"{}\"", field)
    }
}

#[async_trait]
impl<R: PgRecord> CatalogRepository<R> for PgCatalogRepository<R> {
    async fn count(&self, filter: Option<&NameFilter>) -> RepositoryResult<u64> {
        let mut statement = count_statement::<R>(filter);
        let count: i64 = statement
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(Self::fail(RepositoryOperation::Count))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn fetch_page(&self, query: &PageQuery<ColumnOf<R>>) -> RepositoryResult<Vec<R>> {
        let mut statement = page_statement::<R>(query);
        statement
            .build_query_as::<R>()
            .fetch_all(&self.pool)
            .await
            .map_err(Self::fail(RepositoryOperation::FetchPage))
    }

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<R>> {
        let sql = format!("SELECT * FROM \"{}\" WHERE \"Id\" = $1", R::TABLE);
        sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::fail(RepositoryOperation::FindById))
    }

    async fn update(&self, record: &R) -> RepositoryResult<()> {
        let mut statement = QueryBuilder::new(format!("UPDATE \"{}\" SET ", R::TABLE));
        record.push_assignments(&mut statement);
        statement.push(" WHERE \"Id\" = ").push_bind(record.id());
        statement
            .build()
            .execute(&self.pool)
            .await
            .map_err(Self::fail(RepositoryOperation::Update))?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> RepositoryResult<bool> {
        let sql = format!("DELETE FROM \"{}\" WHERE \"Id\" = $1", R::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Self::fail(RepositoryOperation::Delete))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BoardGameColumn, NameMatch};
    use crate::repository::OrderDirection;

    #[test]
    fn test_count_statement_binds_filter() {
        let filter = NameFilter::new("War", NameMatch::Prefix);
        let statement = count_statement::<BoardGame>(Some(&filter));
        assert_eq!(
            statement.sql(),
            "SELECT COUNT(*) FROM \"BoardGames\" WHERE \"Name\" ILIKE $1 ESCAPE '\\'"
        );
    }

    #[test]
    fn test_page_statement_orders_by_typed_column() {
        let query = PageQuery {
            filter: None,
            column: BoardGameColumn::MinPlayers,
            direction: OrderDirection::Descending,
            offset: 20,
            limit: 10,
        };
        let statement = page_statement::<BoardGame>(&query);
        assert_eq!(
            statement.sql(),
            "SELECT * FROM \"BoardGames\" ORDER BY \"MinPlayers\" DESC, \"Id\" ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_page_statement_orders_names_case_insensitively() {
        let query = PageQuery {
            filter: None,
            column: BoardGameColumn::Name,
            direction: OrderDirection::Ascending,
            offset: 0,
            limit: 10,
        };
        let statement = page_statement::<BoardGame>(&query);
        assert_eq!(
            statement.sql(),
            "SELECT * FROM \"BoardGames\" ORDER BY LOWER(\"Name\") ASC, \"Id\" ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_update_assignments() {
        let mut statement = QueryBuilder::new("UPDATE \"Domains\" SET ");
        Domain::new(3, "Wargames").push_assignments(&mut statement);
        assert_eq!(
            statement.sql(),
            "UPDATE \"Domains\" SET \"Name\" = $1, \"LastModifiedDate\" = $2"
        );
    }
}
