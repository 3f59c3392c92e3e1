//! # bglist-service
//!
//! REST catalog of board games, their domains and mechanics.
//!
//! ## Features
//!
//! - **Validated list queries**: paging, sorting and name filtering bound from the query string,
//!   with sort columns resolved against a closed per-resource schema
//! - **Problem documents**: every failure is an `application/problem+json` body with a trace id
//! - **Page caches**: process-local and Redis tiers with a fixed TTL
//! - **Stores**: PostgreSQL through sqlx, or an in-memory catalog
//! - **Role-gated writes**: bearer JWTs with ordered role tiers
//! - **Middleware stack**: request ids, tracing, timeouts, body limits, CORS, security headers
//!
//! ## Example
//!
//! ```rust,no_run
//! use bglist_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::builder()
//!         .config(config.clone())
//!         .build()
//!         .await?;
//!
//!     Server::new(config).serve(state).await
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod observability;
pub mod repository;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

#[cfg(feature = "database")]
pub mod database;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{CacheGate, MemoryCache, PageCache};

    #[cfg(feature = "cache")]
    pub use crate::cache::RedisCache;

    pub use crate::catalog::{
        BoardGame, BoardGameDto, Domain, DomainDto, FieldSchema, Mechanic, MechanicDto,
        NameMatch, Resource, SortColumn, UpdateDto,
    };
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{
        CacheProfile, LinkDto, ProblemDetails, QueryExecutor, RequestContext, RequestDto,
        RequestParams, RestDto, ValidationGate,
    };
    pub use crate::health::health;
    pub use crate::ids::{MakeTypedRequestId, RequestId};
    pub use crate::middleware::{
        AdministratorOrAbove, Authenticated, Authorized, Claims, JwtAuth, ModeratorOrAbove,
        Role, SuperAdminOnly,
    };
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        CatalogRepository, MemoryRepository, RepositoryError, RepositoryErrorKind,
        RepositoryOperation, RepositoryResult,
    };

    #[cfg(feature = "database")]
    pub use crate::repository::PgCatalogRepository;

    pub use crate::server::{app, Server};
    pub use crate::state::{AppState, AppStateBuilder, Catalog};
    pub use crate::validation::ValidationErrors;

    pub use axum::Router;

    pub use tracing::{debug, error, info, warn};
}
