//! Incremental indexing: fingerprints, change detection and the run orchestrator

pub mod change;
pub mod fingerprint;
pub mod indexer;

pub use change::{detect_change, needs_reindex, ChangeReason};
pub use fingerprint::FingerprintStore;
pub use indexer::{IndexReport, Indexer};
