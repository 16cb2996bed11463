//! syncgate server: application entry point.

use std::sync::Arc;

use anyhow::Context;
use syncgate_auth::{SigningKey, TokenService};
use syncgate_db::DbManager;
use syncgate_db::repository::SurrealOrganisationRepository;
use syncgate_server::app::{AppState, build_router};
use syncgate_server::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("syncgate=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    tracing::info!("Starting syncgate server...");

    let config = ServerConfig::from_env().context("load configuration")?;

    // A key that cannot be loaded means no token could ever be issued.
    let key = SigningKey::load(&config.signing_key).context("load POWERSYNC_PRIVATE_KEY")?;
    tracing::info!(
        algorithm = ?key.algorithm(),
        kid = key.key_id(),
        "Loaded signing key"
    );

    let db = DbManager::connect(&config.db)
        .await
        .context("connect to SurrealDB")?;
    if config.run_migrations {
        syncgate_db::run_migrations(db.client())
            .await
            .context("run migrations")?;
    }

    let repo = SurrealOrganisationRepository::new(db.pool());
    let service = TokenService::new(repo, Arc::new(key), config.auth.clone());
    let app = build_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    tracing::info!(bind_addr = %config.bind_addr, "syncgate listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serve")?;

    tracing::info!("syncgate server stopped.");
    Ok(())
}
