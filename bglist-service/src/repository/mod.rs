//! Catalog persistence
//!
//! [`CatalogRepository`] is the seam between the request pipeline and the
//! store. [`MemoryRepository`] keeps records in process; with the `database`
//! feature, [`PgCatalogRepository`] talks to PostgreSQL.

mod error;
mod memory;
mod pagination;
#[cfg(feature = "database")]
mod postgres;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::MemoryRepository;
pub use pagination::{NameFilter, OrderDirection, Page, PageQuery};
#[cfg(feature = "database")]
pub use postgres::{PgCatalogRepository, PgRecord};
pub use traits::{CatalogRepository, RepositoryResult};
