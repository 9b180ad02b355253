mod cleanup;
mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use cupid_api::fallback::JsonFallback;
use cupid_api::state::{AppStateInner, Settings};
use cupid_api::storage::Storage;
use cupid_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cupid_server=debug,cupid_api=debug,cupid_flow=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let storage = Arc::new(Storage::new(config.storage_dir.clone()).await?);
    let fallback = JsonFallback::new(config.fallback_dir.clone()).await?;

    let state = Arc::new(AppStateInner::new(
        db,
        storage,
        fallback,
        Settings {
            public_url: config.public_url.clone(),
            retention_days: config.retention_days,
            admin_token: config.admin_token.clone(),
            max_upload_bytes: config.max_upload_bytes,
        },
    ));

    tokio::spawn(cleanup::run_sweep_loop(
        state.clone(),
        config.sweep_interval_secs,
        Duration::from_secs(config.session_ttl_secs),
    ));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(false);

    // base64 inflates uploads by a third; leave room for several photos
    let body_limit = config.max_upload_bytes.saturating_mul(8);

    let app = cupid_api::router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Cupid server listening on {}", addr);
    info!(
        "Retention: {} days, sweep every {}s",
        config.retention_days, config.sweep_interval_secs
    );
    if config.admin_token.is_none() {
        info!("CUPID_ADMIN_TOKEN not set, maintenance routes are open");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(_) => {
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
