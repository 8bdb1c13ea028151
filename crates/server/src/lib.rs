//! Chirpy server library.
//!
//! A single-process REST backend for short text posts: user accounts, JWT
//! access tokens, refresh-token rotation, and a payment webhook, all backed
//! by one JSON snapshot file.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;

use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::services::ServeDir;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{AppState, ServerConfig};
use handlers::{
    count_hits, delete_chirp, get_chirp, get_chirps, metrics_page, metrics_reset, post_chirp,
    post_login, post_polka, post_refresh, post_revoke, post_user, put_user,
};
use store::{ChirpStore, StoreOptions};

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }

    let config = ServerConfig::from_env()?;

    // Datastore initialization failure is fatal: the server cannot run
    // without its file.
    let store = Arc::new(
        ChirpStore::open(
            &config.database_path,
            StoreOptions {
                debug: config.debug,
                bcrypt_cost: config.bcrypt_cost,
            },
        )
        .await?,
    );
    info!("datastore ready at {:?}", config.database_path);

    let port = config.port;
    let state = AppState {
        store,
        config: Arc::new(config),
        fileserver_hits: Arc::new(AtomicU64::new(0)),
    };

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Chirpy listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the full route table over the given state.
pub fn router(state: AppState) -> Router {
    let static_files = Router::new()
        .nest_service("/app", ServeDir::new("."))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits));

    Router::new()
        .route("/api/healthz", get(health_check))
        // Chirps
        .route("/api/chirps", get(get_chirps).post(post_chirp))
        .route("/api/chirps/{chirp_id}", get(get_chirp).delete(delete_chirp))
        // Users and sessions
        .route("/api/users", post(post_user).put(put_user))
        .route("/api/login", post(post_login))
        .route("/api/refresh", post(post_refresh))
        .route("/api/revoke", post(post_revoke))
        // Payment webhook
        .route("/api/polka/webhooks", post(post_polka))
        // Admin
        .route("/admin/metrics", get(metrics_page))
        .route("/api/reset", get(metrics_reset).post(metrics_reset))
        .merge(static_files)
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}
