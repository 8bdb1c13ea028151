//! Flat-file datastore for users and chirps.
//!
//! Single source of truth with full-snapshot persistence: every operation is
//! one load-modify-persist cycle under a process-wide read/write lock.
//! Readers share the lock, writers are exclusive for their whole cycle, so
//! id assignment and uniqueness checks are linearizable. The lock is
//! intentionally coarse-grained; per-record sharding would be a future
//! extension, not current behavior.

mod backend;

pub use backend::{JsonFileBackend, MemoryBackend, SnapshotBackend};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::auth;
use crate::error::{ApiError, Result};
use crate::models::{Chirp, DbSnapshot, SortOrder, User};

/// Store construction knobs.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Wipe any existing snapshot on startup (debug-mode reset).
    pub debug: bool,
    /// bcrypt work factor for password hashing. Deliberately low by default
    /// so tests run fast; raise it in production deployments.
    pub bcrypt_cost: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            debug: false,
            bcrypt_cost: 4,
        }
    }
}

/// The datastore. One global lock serializes every operation against the
/// backend snapshot; no operation ever spans two critical sections.
pub struct ChirpStore {
    backend: Arc<dyn SnapshotBackend>,
    lock: RwLock<()>,
    bcrypt_cost: u32,
}

impl ChirpStore {
    /// Opens a JSON-file-backed store, creating an empty snapshot when the
    /// file is absent. Failure here is fatal at startup.
    pub async fn open(path: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        let path = path.into();
        info!("opening datastore at {:?} (debug: {})", path, options.debug);
        Self::with_backend(Arc::new(JsonFileBackend::new(path)), options).await
    }

    /// Opens a store over an arbitrary backend.
    pub async fn with_backend(
        backend: Arc<dyn SnapshotBackend>,
        options: StoreOptions,
    ) -> Result<Self> {
        if options.debug {
            backend.destroy().await?;
        }
        if !backend.exists().await {
            backend.write(&DbSnapshot::default()).await?;
        }

        Ok(Self {
            backend,
            lock: RwLock::new(()),
            bcrypt_cost: options.bcrypt_cost,
        })
    }

    /// Removes the underlying snapshot. Test teardown only.
    pub async fn destroy(&self) -> Result<()> {
        let _guard = self.lock.write().await;
        self.backend.destroy().await
    }

    // Chirps

    pub async fn get_chirps(&self, order: SortOrder) -> Result<Vec<Chirp>> {
        let _guard = self.lock.read().await;
        let snapshot = self.backend.read().await?;
        Ok(sort_chirps(snapshot.chirps.into_values().collect(), order))
    }

    pub async fn get_chirps_by_author(&self, author_id: u64, order: SortOrder) -> Result<Vec<Chirp>> {
        let _guard = self.lock.read().await;
        let snapshot = self.backend.read().await?;
        let chirps = snapshot
            .chirps
            .into_values()
            .filter(|chirp| chirp.author_id == author_id)
            .collect();
        Ok(sort_chirps(chirps, order))
    }

    pub async fn get_chirp(&self, chirp_id: u64) -> Result<Chirp> {
        let _guard = self.lock.read().await;
        let snapshot = self.backend.read().await?;
        snapshot
            .chirps
            .get(&chirp_id)
            .cloned()
            .ok_or(ApiError::ChirpNotFound)
    }

    /// Creates a chirp with id `count + 1`. The whole cycle runs under the
    /// exclusive lock so two concurrent creations can never share an id.
    pub async fn create_chirp(&self, body: String, author_id: u64) -> Result<Chirp> {
        let _guard = self.lock.write().await;
        let mut snapshot = self.backend.read().await?;

        let id = snapshot.chirps.len() as u64 + 1;
        let chirp = Chirp { id, body, author_id };
        snapshot.chirps.insert(id, chirp.clone());
        self.backend.write(&snapshot).await?;

        Ok(chirp)
    }

    /// Deletes a chirp. Only the highest-numbered chirp is deletable and
    /// only by its author. The positional check treats the id as a position;
    /// DESIGN.md flags it for product review.
    pub async fn delete_chirp(&self, user_id: u64, chirp_id: u64) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut snapshot = self.backend.read().await?;

        if chirp_id != snapshot.chirps.len() as u64 {
            return Err(ApiError::IncorrectChirpId);
        }
        let chirp = snapshot
            .chirps
            .get(&chirp_id)
            .ok_or(ApiError::ChirpNotFound)?;
        if chirp.author_id != user_id {
            return Err(ApiError::IncorrectAuthorId);
        }

        snapshot.chirps.remove(&chirp_id);
        self.backend.write(&snapshot).await?;

        Ok(())
    }

    // Users

    /// Creates a user with id `count + 1`, rejecting duplicate emails. The
    /// email scan is case-sensitive, exact-match.
    pub async fn create_user(&self, email: String, password: &str) -> Result<User> {
        let _guard = self.lock.write().await;
        let mut snapshot = self.backend.read().await?;

        if snapshot.users.values().any(|user| user.email == email) {
            return Err(ApiError::UserAlreadyExists);
        }

        let id = snapshot.users.len() as u64 + 1;
        let user = User {
            id,
            email,
            pss_hash: auth::hash_password(password, self.bcrypt_cost)?,
            refresh_token: String::new(),
            is_chirpy_red: false,
        };
        snapshot.users.insert(id, user.clone());
        self.backend.write(&snapshot).await?;

        info!("created user {}", user.id);
        Ok(user)
    }

    /// Overwrites email and password hash unconditionally. The caller must
    /// have proven ownership of `id` via a validated access token first.
    pub async fn update_user(&self, id: u64, email: String, password: &str) -> Result<User> {
        let _guard = self.lock.write().await;
        let mut snapshot = self.backend.read().await?;

        let pss_hash = auth::hash_password(password, self.bcrypt_cost)?;
        let user = snapshot.users.get_mut(&id).ok_or(ApiError::UserNotFound)?;
        user.email = email;
        user.pss_hash = pss_hash;
        let updated = user.clone();
        self.backend.write(&snapshot).await?;

        Ok(updated)
    }

    /// Checks credentials and returns the matching user. Read-only.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let _guard = self.lock.read().await;
        let snapshot = self.backend.read().await?;

        let user = snapshot
            .users
            .into_values()
            .find(|user| user.email == email)
            .ok_or(ApiError::UserNotFound)?;

        if !auth::verify_password(password, &user.pss_hash)? {
            return Err(ApiError::IncorrectPassword);
        }

        Ok(user)
    }

    /// Stores a refresh token on a user, replacing any prior one. At most
    /// one refresh token is outstanding per user: a new login ends the
    /// previous session.
    pub async fn save_refresh_token(&self, user_id: u64, token: &str) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut snapshot = self.backend.read().await?;

        let user = snapshot
            .users
            .get_mut(&user_id)
            .ok_or(ApiError::UserNotFound)?;
        user.refresh_token = token.to_string();
        self.backend.write(&snapshot).await?;

        Ok(())
    }

    /// Looks up the holder of a refresh token. An empty stored token means
    /// no active session and never matches.
    pub async fn validate_refresh_token(&self, token: &str) -> Result<User> {
        let _guard = self.lock.read().await;
        let snapshot = self.backend.read().await?;

        let user = snapshot
            .users
            .into_values()
            .find(|user| !user.refresh_token.is_empty() && user.refresh_token == token)
            .ok_or(ApiError::UserNotFound)?;

        // Re-check after the scan; a mismatch here means the lookup matched
        // something it should not have.
        if user.refresh_token != token {
            return Err(ApiError::unauthorized("incorrect refresh token"));
        }

        Ok(user)
    }

    /// Clears a refresh token, ending the session it represents.
    pub async fn revoke_refresh_token(&self, token: &str) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut snapshot = self.backend.read().await?;

        let user = snapshot
            .users
            .values_mut()
            .find(|user| !user.refresh_token.is_empty() && user.refresh_token == token)
            .ok_or(ApiError::UserNotFound)?;
        user.refresh_token = String::new();
        self.backend.write(&snapshot).await?;

        Ok(())
    }

    /// Flags a user as Chirpy Red. One-way: there is no downgrade path.
    pub async fn upgrade_to_red(&self, user_id: u64) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut snapshot = self.backend.read().await?;

        let user = snapshot
            .users
            .get_mut(&user_id)
            .ok_or(ApiError::UserNotFound)?;
        user.is_chirpy_red = true;
        self.backend.write(&snapshot).await?;

        info!("user {} upgraded to chirpy red", user_id);
        Ok(())
    }
}

fn sort_chirps(mut chirps: Vec<Chirp>, order: SortOrder) -> Vec<Chirp> {
    chirps.sort_by_key(|chirp| chirp.id);
    if order == SortOrder::Descending {
        chirps.reverse();
    }
    chirps
}
