//! Database connection pool management

#![cfg(feature = "database")]

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};

/// Create a PostgreSQL connection pool with retry logic
///
/// Uses exponential backoff between attempts and applies the bundled
/// migrations once connected when `run_migrations` is set.
pub(crate) async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = create_pool_with_retries(config).await?;
    if config.run_migrations {
        migrate(&pool).await?;
    }
    Ok(pool)
}

async fn create_pool_with_retries(config: &DatabaseConfig) -> Result<PgPool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Database connection pool created: max={}, min={}",
                        config.max_connections,
                        config.min_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));

                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Attempt to create a database pool (single try)
async fn try_create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| {
            let mut err = RepositoryError::from_sqlx(RepositoryOperation::Connect, e);
            err.message = format!(
                "Failed to connect to database at '{}': {}",
                sanitize_connection_url(&config.url),
                err.message
            );
            Error::Repository(err)
        })
}

/// Apply the schema migrations shipped in `migrations/`
async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        Error::Repository(RepositoryError::new(
            RepositoryOperation::Migrate,
            RepositoryErrorKind::Other,
            e.to_string(),
        ))
    })?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Sanitize connection URL for safe logging (remove password)
fn sanitize_connection_url(url: &str) -> String {
    if let (Some(at_pos), Some(scheme_end)) = (url.find('@'), url.find("://")) {
        let credentials = &url[scheme_end + 3..at_pos];
        if let Some(colon_pos) = credentials.find(':') {
            return format!(
                "{}{}:***{}",
                &url[..scheme_end + 3],
                &credentials[..colon_pos],
                &url[at_pos..]
            );
        }
    }
    url.to_string()
}
