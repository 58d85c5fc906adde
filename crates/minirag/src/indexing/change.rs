//! Decides whether a file has to be indexed again

use chrono::{DateTime, Utc};

use crate::types::FileRecord;

/// Why a file is (re-)indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// The run rebuilds everything
    Forced,
    /// No record for the path yet
    New,
    /// Modification time differs from the record
    Modified,
    /// Size differs from the record
    Resized,
}

impl std::fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Forced => "forced",
            Self::New => "new",
            Self::Modified => "modified",
            Self::Resized => "resized",
        };
        f.write_str(s)
    }
}

/// Compare the current fingerprint of a file with its record.
///
/// Timestamps are compared exactly. Content is never inspected, so a rewrite
/// that keeps both timestamp and size goes unnoticed.
pub fn detect_change(
    record: Option<&FileRecord>,
    modified: DateTime<Utc>,
    size: u64,
    force: bool,
) -> Option<ChangeReason> {
    if force {
        return Some(ChangeReason::Forced);
    }
    match record {
        None => Some(ChangeReason::New),
        Some(r) if r.last_modified != modified => Some(ChangeReason::Modified),
        Some(r) if r.size != size => Some(ChangeReason::Resized),
        Some(_) => None,
    }
}

/// Boolean form of [`detect_change`]
pub fn needs_reindex(
    record: Option<&FileRecord>,
    modified: DateTime<Utc>,
    size: u64,
    force: bool,
) -> bool {
    detect_change(record, modified, size, force).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(modified: DateTime<Utc>, size: u64) -> FileRecord {
        FileRecord {
            path: "a.txt".to_string(),
            last_modified: modified,
            size,
            chunk_count: 1,
        }
    }

    #[test]
    fn test_unchanged_is_skipped() {
        let now = Utc::now();
        let rec = record(now, 100);
        assert_eq!(detect_change(Some(&rec), now, 100, false), None);
        assert!(!needs_reindex(Some(&rec), now, 100, false));
    }

    #[test]
    fn test_reasons() {
        let now = Utc::now();
        let rec = record(now, 100);
        assert_eq!(detect_change(None, now, 100, false), Some(ChangeReason::New));
        assert_eq!(detect_change(Some(&rec), now, 100, true), Some(ChangeReason::Forced));
        assert_eq!(detect_change(Some(&rec), now, 101, false), Some(ChangeReason::Resized));
        assert_eq!(
            detect_change(Some(&rec), now + Duration::seconds(1), 100, false),
            Some(ChangeReason::Modified)
        );
    }

    #[test]
    fn test_no_tolerance_window() {
        let now = Utc::now();
        let rec = record(now, 100);
        let later = now + Duration::nanoseconds(1);
        assert!(needs_reindex(Some(&rec), later, 100, false));
    }
}
