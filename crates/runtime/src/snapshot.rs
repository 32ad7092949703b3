//! On-disk snapshot persistence.
//!
//! Snapshots are pretty-printed JSON written to a temp file and atomically
//! renamed into place, so a crash mid-write never clobbers the previous
//! snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use mudlark_engine::ZoneSnapshot;

use crate::error::{Result, RuntimeError};

#[derive(Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Conventional location for a zone's snapshot inside a world directory.
    pub fn for_zone(world_dir: &Path, zone: &str) -> Self {
        Self::new(world_dir.join("snapshots").join(format!("{zone}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, snapshot: &ZoneSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| RuntimeError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, bytes).map_err(|source| RuntimeError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| RuntimeError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), entities = snapshot.entities.len(), "snapshot saved");
        Ok(())
    }

    pub fn load(&self) -> Result<Option<ZoneSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path).map_err(|source| RuntimeError::Io {
            path: self.path.clone(),
            source,
        })?;
        let snapshot = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %self.path.display(), "snapshot loaded");
        Ok(Some(snapshot))
    }
}
