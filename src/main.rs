use anyhow::{Context, Result};
use dotenvy::dotenv;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

mod components;
mod config;
mod controllers;
mod db_ops;
mod derived;
mod errors;
mod htmx;
mod logging;
mod middleware;
mod models;
mod notify;
mod realtime;
mod relay;
mod routes;
mod snapshot;
mod store;

/// Remote change events buffered between the listener and the store.
const CHANGE_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    logging::init();

    let config = config::Config::from_env()?;
    let db = create_pg_pool(&config.database_url)?;
    // An unreachable database is not fatal: the store falls back to its
    // snapshot and the screens show it as offline.
    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
        tracing::error!(error = ?e, "running migrations failed");
    }

    let backend: Arc<dyn db_ops::NoteBackend> =
        Arc::new(db_ops::PgBackend::new(db.clone()));
    let notifier: Arc<dyn notify::Notifier> = match &config.relay_url {
        Some(url) => Arc::new(notify::RelayNotifier::new(url.clone())?),
        None => Arc::new(notify::Disabled),
    };
    let snapshot = snapshot::Snapshot::new(&config.snapshot_path);
    tracing::info!(path = %snapshot.path().display(), "note snapshot");
    let store = store::NoteStore::new(backend.clone(), notifier, snapshot);

    // The supervisor does the first load once its listener is up, and
    // reloads whenever it reconnects.
    let (tx, rx) = mpsc::channel(CHANGE_BUFFER);
    tokio::spawn({
        let store = store.clone();
        async move { store.subscribe(rx).await }
    });
    tokio::spawn(realtime::supervise(db, backend, store.clone(), tx));

    if config.push.api_key.is_none() {
        tracing::warn!("ONESIGNAL_API_KEY not set; push relay will not forward");
    }
    let provider = Arc::new(relay::OneSignal::new(config.push.clone())?);
    let state = models::AppState { store, provider };
    let app = routes::get_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(addr = %config.listen_addr, "listening");
    axum::Server::bind(&config.listen_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

/// Connections are opened on first use, so a database that is down at boot
/// doesn't keep the server from starting.
fn create_pg_pool(db_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config::MAX_DB_CONNECTIONS)
        .connect_lazy(db_url)
        .context("parsing database url")?;

    Ok(pool)
}
