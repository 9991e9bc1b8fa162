//! SnapBase Transactional Storage Engine
//!
//! A single-node, in-memory MVCC engine implemented in Rust.
//! Transactions read and mutate keyed rows under a stable snapshot taken at
//! BEGIN; concurrent writers to the same key are resolved first-committer-wins.

pub mod data;
pub mod db;
pub mod mvcc;
pub mod txn;

// Re-export main types
pub use data::{Row, Value};
pub use db::{Database, Record};
pub use mvcc::{RowStore, Snapshot, VersionedRow, VisibilityEngine};
pub use txn::{CommitTable, ConflictDetector, ConflictResult, Transaction, TxnId, TxnManager};

/// Storage engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Key not visible in snapshot: {0}")]
    KeyNotVisible(String),

    #[error("Write-write conflict on key '{0}'")]
    WriteWriteConflict(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
