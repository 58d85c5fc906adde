//! Durable storage of the fingerprint snapshot

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::FingerprintSnapshot;

/// JSON file holding a [`FingerprintSnapshot`]
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot; a missing file yields an empty snapshot
    pub fn load(&self) -> Result<FingerprintSnapshot> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::internal(format!(
                    "Corrupt fingerprint snapshot {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(FingerprintSnapshot::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the snapshot as a whole (temp file + rename)
    pub fn save(&self, snapshot: &FingerprintSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(
            "Saved fingerprint snapshot with {} files to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Remove the snapshot file if present
    pub fn delete(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileRecord;
    use chrono::Utc;

    #[test]
    fn test_missing_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("metadata.json"));
        let snapshot = store.load().unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.recorded_root.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("metadata.json"));

        let mut snapshot = FingerprintSnapshot::default();
        snapshot.recorded_root = Some(dir.path().to_path_buf());
        snapshot.insert(FileRecord {
            path: "guide/intro.md".to_string(),
            last_modified: Utc::now(),
            size: 512,
            chunk_count: 1,
        });
        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap(), snapshot);
        assert!(!dir.path().join("metadata.json.tmp").exists());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("metadata.json"));
        store.save(&FingerprintSnapshot::default()).unwrap();
        store.delete().unwrap();
        store.delete().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(FingerprintStore::new(path).load().is_err());
    }
}
