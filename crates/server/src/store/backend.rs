//! Snapshot storage backends.
//!
//! The store logic never touches a file path directly; it talks to a
//! [`SnapshotBackend`]. The JSON file variant is the production one, the
//! in-memory variant exists for tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;

use crate::error::Result;
use crate::models::DbSnapshot;

/// Whole-snapshot load/save. Callers are responsible for serializing access;
/// a backend only moves bytes.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Loads the full snapshot. Fails if none has been written yet.
    async fn read(&self) -> Result<DbSnapshot>;

    /// Replaces the stored snapshot in full.
    async fn write(&self, snapshot: &DbSnapshot) -> Result<()>;

    /// Whether a snapshot has ever been written.
    async fn exists(&self) -> bool;

    /// Removes the stored snapshot, if any. Used for test teardown and the
    /// debug-mode reset.
    async fn destroy(&self) -> Result<()>;
}

/// Snapshot persisted as a single JSON document on disk.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotBackend for JsonFileBackend {
    async fn read(&self) -> Result<DbSnapshot> {
        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn write(&self, snapshot: &DbSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;

        // Write to a temp file, then rename into place so the snapshot on
        // disk is never half-written.
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }

    async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn destroy(&self) -> Result<()> {
        if self.exists().await {
            fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}

/// In-memory snapshot for tests. `None` models the absent-file state.
#[derive(Default)]
pub struct MemoryBackend {
    snapshot: RwLock<Option<DbSnapshot>>,
}

#[async_trait]
impl SnapshotBackend for MemoryBackend {
    async fn read(&self) -> Result<DbSnapshot> {
        self.snapshot.read().clone().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no snapshot written").into()
        })
    }

    async fn write(&self, snapshot: &DbSnapshot) -> Result<()> {
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(())
    }

    async fn exists(&self) -> bool {
        self.snapshot.read().is_some()
    }

    async fn destroy(&self) -> Result<()> {
        *self.snapshot.write() = None;
        Ok(())
    }
}
