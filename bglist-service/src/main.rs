//! bglist-service binary

use anyhow::Context;
use bglist_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    init_tracing(&config)?;

    info!("Starting {} v{}", config.service.name, env!("CARGO_PKG_VERSION"));
    info!("Routes:");
    info!("  GET    /BoardGames, /BoardGames/{{id}}, /Domains, /Mechanics");
    info!("  POST   /BoardGames, /Domains, /Mechanics (Moderator+)");
    info!("  DELETE /BoardGames, /Domains, /Mechanics (Administrator+)");
    info!("  GET    /health");

    let state = AppState::builder()
        .config(config.clone())
        .build()
        .await
        .context("failed to build application state")?;

    Server::new(config).serve(state).await?;

    Ok(())
}
