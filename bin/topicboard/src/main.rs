//! # topicboard Binary
//!
//! The entry point that assembles the application from its plugins.

use std::sync::Arc;

use anyhow::Context;
use tb_api::AppState;
use tb_auth_simple::SimpleAuthProvider;
use tb_config::{LogSettings, Settings};
use tb_db_sqlite::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);

    // 1. Initialize Database Implementation
    let store = Arc::new(
        SqliteStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("opening database")?,
    );

    // 2. Initialize Auth Implementation
    let auth = Arc::new(SimpleAuthProvider::new(
        store.clone(),
        settings.auth.realm.clone(),
    ));

    // 3. Wrap in AppState (dynamic dispatch keeps plugins swappable)
    let state = AppState::new(store, auth);
    let app = tb_api::router(state);

    let (host, port) = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {host}:{port}"))?;
    tracing::info!("topicboard starting on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
