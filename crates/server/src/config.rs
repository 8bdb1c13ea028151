//! Server configuration and shared state.

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use anyhow::Context;

use crate::store::ChirpStore;

/// Configuration for the Chirpy server, read from the environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Path of the JSON snapshot file.
    pub database_path: PathBuf,
    /// Symmetric secret for signing access tokens.
    pub jwt_secret: String,
    /// Pre-shared key expected from the payment webhook caller.
    pub polka_key: String,
    /// Listen port.
    pub port: u16,
    /// Wipe the datastore on startup.
    pub debug: bool,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let polka_key = std::env::var("POLKA_KEY").context("POLKA_KEY must be set")?;

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./database.json"));
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);
        let debug = std::env::var("DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let bcrypt_cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4);

        Ok(Self {
            database_path,
            jwt_secret,
            polka_key,
            port,
            debug,
            bcrypt_cost,
        })
    }
}

/// App state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ChirpStore>,
    pub config: Arc<ServerConfig>,
    /// Fileserver hit counter for the admin metrics page.
    pub fileserver_hits: Arc<AtomicU64>,
}
