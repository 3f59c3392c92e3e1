//! Application state shared across handlers

use std::sync::Arc;

use crate::cache::CacheGate;
use crate::catalog::{BoardGame, Domain, Mechanic};
use crate::config::Config;
use crate::error::Result;
use crate::middleware::JwtAuth;
use crate::repository::{CatalogRepository, MemoryRepository};

#[cfg(feature = "database")]
use crate::repository::PgCatalogRepository;

#[cfg(feature = "cache")]
use crate::cache::RedisCache;

/// One repository per catalog resource
#[derive(Clone)]
pub struct Catalog {
    pub board_games: Arc<dyn CatalogRepository<BoardGame>>,
    pub domains: Arc<dyn CatalogRepository<Domain>>,
    pub mechanics: Arc<dyn CatalogRepository<Mechanic>>,
}

impl Catalog {
    /// Empty in-memory catalog
    pub fn in_memory() -> Self {
        Self::from_records(Vec::new(), Vec::new(), Vec::new())
    }

    /// In-memory catalog seeded with the given records
    pub fn from_records(
        board_games: Vec<BoardGame>,
        domains: Vec<Domain>,
        mechanics: Vec<Mechanic>,
    ) -> Self {
        Self {
            board_games: Arc::new(MemoryRepository::with_records(board_games)),
            domains: Arc::new(MemoryRepository::with_records(domains)),
            mechanics: Arc::new(MemoryRepository::with_records(mechanics)),
        }
    }

    /// Catalog backed by PostgreSQL tables
    #[cfg(feature = "database")]
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            board_games: Arc::new(PgCatalogRepository::<BoardGame>::new(pool.clone())),
            domains: Arc::new(PgCatalogRepository::<Domain>::new(pool.clone())),
            mechanics: Arc::new(PgCatalogRepository::<Mechanic>::new(pool)),
        }
    }
}

/// Application state
///
/// Board game pages and single-record lookups go through a process-local
/// cache; mechanic pages go through the distributed cache when Redis is
/// configured. Domains are never cached.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    catalog: Catalog,
    board_game_cache: CacheGate,
    mechanic_cache: CacheGate,
    jwt: Option<JwtAuth>,
}

impl AppState {
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn board_game_cache(&self) -> &CacheGate {
        &self.board_game_cache
    }

    pub fn mechanic_cache(&self) -> &CacheGate {
        &self.mechanic_cache
    }

    /// JWT authenticator, present only when `[jwt]` is configured
    pub fn jwt(&self) -> Option<&JwtAuth> {
        self.jwt.as_ref()
    }
}

/// Builder for application state
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<Config>,
    catalog: Option<Catalog>,
    board_game_cache: Option<CacheGate>,
    mechanic_cache: Option<CacheGate>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use these repositories instead of connecting to the configured store
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn board_game_cache(mut self, cache: CacheGate) -> Self {
        self.board_game_cache = Some(cache);
        self
    }

    pub fn mechanic_cache(mut self, cache: CacheGate) -> Self {
        self.mechanic_cache = Some(cache);
        self
    }

    /// Build the application state
    ///
    /// Connects to PostgreSQL and Redis when they are configured and not
    /// overridden. Connection failures are returned after the pools' own
    /// retries are exhausted.
    pub async fn build(self) -> Result<AppState> {
        let config = self.config.unwrap_or_default();
        let ttl = config.cache.ttl();

        let jwt = config.jwt.as_ref().map(JwtAuth::new).transpose()?;
        if jwt.is_none() {
            tracing::warn!("No JWT configuration, protected endpoints will reject every request");
        }

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => connect_catalog(&config).await?,
        };

        let board_game_cache = self
            .board_game_cache
            .unwrap_or_else(|| CacheGate::in_memory(ttl));

        let mechanic_cache = match self.mechanic_cache {
            Some(cache) => cache,
            None => distributed_cache(&config).await?,
        };

        tracing::debug!(
            board_game_cache = ?board_game_cache,
            mechanic_cache = ?mechanic_cache,
            "application state ready"
        );

        Ok(AppState {
            config: Arc::new(config),
            catalog,
            board_game_cache,
            mechanic_cache,
            jwt,
        })
    }
}

#[cfg(feature = "database")]
async fn connect_catalog(config: &Config) -> Result<Catalog> {
    match &config.database {
        Some(db_config) => {
            let pool = crate::database::create_pool(db_config).await?;
            Ok(Catalog::postgres(pool))
        }
        None => {
            tracing::warn!("No database configured, serving an empty in-memory catalog");
            Ok(Catalog::in_memory())
        }
    }
}

#[cfg(not(feature = "database"))]
async fn connect_catalog(config: &Config) -> Result<Catalog> {
    if config.database.is_some() {
        tracing::warn!("Database configured but the `database` feature is disabled");
    }
    Ok(Catalog::in_memory())
}

#[cfg(feature = "cache")]
async fn distributed_cache(config: &Config) -> Result<CacheGate> {
    let ttl = config.cache.ttl();
    match &config.redis {
        Some(redis_config) => {
            let pool = crate::cache::create_pool(redis_config).await?;
            let backend = RedisCache::new(pool, redis_config.key_prefix.clone());
            Ok(CacheGate::new(Arc::new(backend), ttl))
        }
        None => {
            tracing::warn!("No Redis configured, mechanic pages use a process-local cache");
            Ok(CacheGate::in_memory(ttl))
        }
    }
}

#[cfg(not(feature = "cache"))]
async fn distributed_cache(config: &Config) -> Result<CacheGate> {
    if config.redis.is_some() {
        tracing::warn!("Redis configured but the `cache` feature is disabled");
    }
    Ok(CacheGate::in_memory(config.cache.ttl()))
}
