//! Conflict Detector - First-committer-wins validation at commit
//!
//! At commit time, every key the transaction wants to write is checked
//! against the versions already in the store. A version created by another
//! transaction that committed at or after our snapshot's `xmin` means a
//! concurrent writer got there first.

use std::sync::Arc;

use crate::mvcc::version_store::RowStore;
use crate::{EngineError, Result};

use super::commit_table::CommitTable;
use super::transaction::Transaction;

/// Result of commit-time validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResult {
    /// No conflicts detected - safe to commit
    NoConflict,
    /// Another committed transaction wrote `key` at or after our xmin
    WriteWrite { key: String },
}

impl ConflictResult {
    /// Whether the result indicates no conflict
    pub fn is_ok(&self) -> bool {
        matches!(self, ConflictResult::NoConflict)
    }

    /// Convert into the engine result (for error propagation)
    pub fn into_result(self) -> Result<()> {
        match self {
            ConflictResult::NoConflict => Ok(()),
            ConflictResult::WriteWrite { key } => Err(EngineError::WriteWriteConflict(key)),
        }
    }
}

/// First-committer-wins detector over the row store and commit table
///
/// The comparison horizon is `snapshot.xmin`: a writer that terminated
/// before our BEGIN never made it into our active set, leaves our `xmin`
/// at our own id, and is tolerated.
pub struct ConflictDetector {
    store: Arc<RowStore>,
    commit_table: Arc<CommitTable>,
}

impl ConflictDetector {
    /// Create a detector bound to the store and registry
    pub fn new(store: Arc<RowStore>, commit_table: Arc<CommitTable>) -> Self {
        Self {
            store,
            commit_table,
        }
    }

    /// Validate `txn`'s write set against committed concurrent versions
    pub fn detect(&self, txn: &Transaction) -> ConflictResult {
        for key in txn.writes().keys() {
            for version in self.store.all_versions(key) {
                if version.xmin == txn.id() {
                    continue;
                }
                if self.commit_table.is_committed(version.xmin)
                    && version.xmin >= txn.snapshot().xmin
                {
                    log::debug!(
                        "txn {} conflicts with committed txn {} on key '{}'",
                        txn.id(),
                        version.xmin,
                        key
                    );
                    return ConflictResult::WriteWrite { key: key.clone() };
                }
            }
        }
        ConflictResult::NoConflict
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::data::Row;
    use crate::mvcc::{Snapshot, VersionedRow};
    use crate::txn::TxnId;

    fn txn_with_write(id: TxnId, xmin: TxnId, key: &str) -> Transaction {
        let mut t = Transaction::new(id, Snapshot::new(xmin, id, HashSet::new(), id));
        t.add_write(key, VersionedRow::new(key, Row::new(), id));
        t
    }

    #[test]
    fn test_clean_when_store_empty() {
        let store = Arc::new(RowStore::new());
        let table = Arc::new(CommitTable::new());
        let detector = ConflictDetector::new(store, table);

        assert!(detector.detect(&txn_with_write(2, 2, "k")).is_ok());
    }

    #[test]
    fn test_concurrent_committed_writer_conflicts() {
        let store = Arc::new(RowStore::new());
        let table = Arc::new(CommitTable::new());
        store.append(VersionedRow::new("k", Row::new(), 3));
        table.mark_committed(3);

        let detector = ConflictDetector::new(store, table);
        // Writer 3 sits at or above our xmin of 2
        let verdict = detector.detect(&txn_with_write(4, 2, "k"));
        assert_eq!(
            verdict,
            ConflictResult::WriteWrite {
                key: "k".to_string()
            }
        );
        let err = verdict.into_result().unwrap_err();
        assert!(err.to_string().contains("Write-write conflict"));
    }

    #[test]
    fn test_writer_below_xmin_tolerated() {
        let store = Arc::new(RowStore::new());
        let table = Arc::new(CommitTable::new());
        store.append(VersionedRow::new("k", Row::new(), 1));
        table.mark_committed(1);

        let detector = ConflictDetector::new(store, table);
        assert!(detector.detect(&txn_with_write(4, 2, "k")).is_ok());
    }

    #[test]
    fn test_uncommitted_writer_ignored() {
        let store = Arc::new(RowStore::new());
        let table = Arc::new(CommitTable::new());
        store.append(VersionedRow::new("k", Row::new(), 3));

        let detector = ConflictDetector::new(store, table);
        assert!(detector.detect(&txn_with_write(4, 2, "k")).is_ok());
    }

    #[test]
    fn test_own_versions_skipped() {
        let store = Arc::new(RowStore::new());
        let table = Arc::new(CommitTable::new());
        store.append(VersionedRow::new("k", Row::new(), 4));
        table.mark_committed(4);

        let detector = ConflictDetector::new(store, table);
        assert!(detector.detect(&txn_with_write(4, 2, "k")).is_ok());
    }

    #[test]
    fn test_untouched_keys_not_checked() {
        let store = Arc::new(RowStore::new());
        let table = Arc::new(CommitTable::new());
        store.append(VersionedRow::new("other", Row::new(), 3));
        table.mark_committed(3);

        let detector = ConflictDetector::new(store, table);
        assert!(detector.detect(&txn_with_write(4, 2, "k")).is_ok());
    }
}
