//! Per-file indexing state persisted between runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fingerprint of a file that was fully indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the document root, `/`-separated
    pub path: String,
    /// Modification time observed when the file was indexed
    pub last_modified: DateTime<Utc>,
    /// File size in bytes
    pub size: u64,
    /// Number of chunks submitted for the file
    #[serde(default)]
    pub chunk_count: usize,
}

/// Outcome of comparing the recorded root against the configured one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootCheck {
    /// Recorded root equals the configured root
    Matches,
    /// Nothing was recorded yet
    Fresh,
    /// The snapshot belongs to another directory and must be discarded
    InvalidationRequired { recorded: Option<PathBuf> },
}

/// All file records plus the root they were computed against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintSnapshot {
    #[serde(default)]
    pub files: BTreeMap<String, FileRecord>,
    #[serde(default, rename = "data_path", skip_serializing_if = "Option::is_none")]
    pub recorded_root: Option<PathBuf>,
}

impl FingerprintSnapshot {
    /// Compare the recorded root with the configured document root
    pub fn check_root(&self, root: &Path) -> RootCheck {
        match &self.recorded_root {
            Some(recorded) if recorded == root => RootCheck::Matches,
            None if self.files.is_empty() => RootCheck::Fresh,
            recorded => RootCheck::InvalidationRequired {
                recorded: recorded.clone(),
            },
        }
    }

    /// Look up the record for a relative path
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// Insert or replace a record
    pub fn insert(&mut self, record: FileRecord) {
        self.files.insert(record.path.clone(), record);
    }

    /// Number of recorded files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no file is recorded
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            last_modified: Utc::now(),
            size: 10,
            chunk_count: 1,
        }
    }

    #[test]
    fn test_root_check() {
        let mut snapshot = FingerprintSnapshot::default();
        assert_eq!(snapshot.check_root(Path::new("/docs")), RootCheck::Fresh);

        snapshot.insert(record("a.md"));
        assert!(matches!(
            snapshot.check_root(Path::new("/docs")),
            RootCheck::InvalidationRequired { recorded: None }
        ));

        snapshot.recorded_root = Some(PathBuf::from("/docs"));
        assert_eq!(snapshot.check_root(Path::new("/docs")), RootCheck::Matches);
        assert!(matches!(
            snapshot.check_root(Path::new("/other")),
            RootCheck::InvalidationRequired { recorded: Some(_) }
        ));
    }

    #[test]
    fn test_reads_records_without_chunk_count() {
        let json = r#"{"files":{"a.md":{"path":"a.md","last_modified":"2024-05-01T10:00:00.123456789Z","size":42}},"data_path":"/docs"}"#;
        let snapshot: FingerprintSnapshot = serde_json::from_str(json).unwrap();
        let rec = snapshot.get("a.md").unwrap();
        assert_eq!(rec.size, 42);
        assert_eq!(rec.chunk_count, 0);
        assert_eq!(rec.last_modified.timestamp_subsec_nanos(), 123_456_789);
        assert_eq!(snapshot.recorded_root.as_deref(), Some(Path::new("/docs")));
    }
}
