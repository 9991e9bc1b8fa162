//! Database Service - Orchestrates the MVCC transactional kernel
//!
//! Wires the transaction manager, commit table, visibility engine, row
//! store and conflict detector together behind the public begin / insert /
//! update / delete / select / commit / abort operations. All operations are
//! synchronous; the caller serializes them.

use std::sync::Arc;

use crate::data::Row;
use crate::mvcc::{RowStore, VersionedRow, VisibilityEngine};
use crate::txn::{CommitTable, ConflictDetector, Transaction, TxnManager};
use crate::{EngineError, Result};

/// A row returned by `select`: the key plus the visible payload
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Row key
    pub key: String,
    /// The visible payload fields
    pub data: Row,
}

/// The database service
///
/// Writes accumulate in the transaction's buffer and reach the store only
/// at commit; a conflicting commit aborts the transaction before the error
/// is surfaced. Every successful commit runs a GC pass bounded by the
/// oldest live snapshot.
pub struct Database {
    txn_manager: TxnManager,
    commit_table: Arc<CommitTable>,
    visibility: VisibilityEngine,
    store: Arc<RowStore>,
    conflict: ConflictDetector,
}

impl Database {
    /// Create an empty engine
    pub fn new() -> Self {
        let commit_table = Arc::new(CommitTable::new());
        let store = Arc::new(RowStore::new());
        Self {
            txn_manager: TxnManager::new(),
            visibility: VisibilityEngine::new(Arc::clone(&commit_table)),
            conflict: ConflictDetector::new(Arc::clone(&store), Arc::clone(&commit_table)),
            commit_table,
            store,
        }
    }

    /// BEGIN - open a transaction under a fresh snapshot
    pub fn begin(&self) -> Transaction {
        self.txn_manager.begin()
    }

    /// Buffer an insert for `key`; applied at commit. Never fails: no
    /// visibility or uniqueness check is made.
    pub fn insert(&self, txn: &mut Transaction, key: &str, data: Row) {
        txn.add_write(key, VersionedRow::new(key, data, txn.id()));
    }

    /// Buffer an update of the version of `key` visible to `txn`
    ///
    /// Emits a tombstone of the visible version followed by a new version
    /// whose payload is the visible payload overlaid with `data`
    /// (right-biased, shallow).
    pub fn update(&self, txn: &mut Transaction, key: &str, data: Row) -> Result<()> {
        let visible = self.visible_version(txn, key)?;
        let merged = merge_row(&visible.data, data);
        txn.add_write(key, visible.tombstone(txn.id()));
        txn.add_write(key, VersionedRow::new(key, merged, txn.id()));
        Ok(())
    }

    /// Buffer a delete of the version of `key` visible to `txn`
    ///
    /// The tombstone keeps the visible version's creator stamp.
    pub fn delete(&self, txn: &mut Transaction, key: &str) -> Result<()> {
        let visible = self.visible_version(txn, key)?;
        txn.add_write(key, visible.tombstone(txn.id()));
        Ok(())
    }

    /// Read the rows visible to `txn`, one record per key with a visible
    /// version
    ///
    /// `keys` defaults to every key in the store; output follows input key
    /// order. Committed versions are scanned first, then the transaction's
    /// own buffered rows, so uncommitted own inserts are readable.
    pub fn select(&self, txn: &mut Transaction, keys: Option<&[&str]>) -> Vec<Record> {
        let keys: Vec<String> = match keys {
            Some(keys) => keys.iter().map(|k| k.to_string()).collect(),
            None => self.store.all_keys(),
        };
        let mut records = Vec::new();
        for key in keys {
            txn.add_read(&key);
            let mut versions = self.store.all_versions(&key);
            versions.extend(txn.pending(&key).iter().cloned());
            if let Some(row) = versions
                .iter()
                .find(|v| self.visibility.is_visible(v, txn.snapshot()))
            {
                records.push(Record {
                    key: row.key.clone(),
                    data: row.data.clone(),
                });
            }
        }
        records
    }

    /// COMMIT - validate, publish the buffered writes, and collect garbage
    ///
    /// On a write-write conflict the transaction is aborted and the
    /// conflict is returned; nothing reaches the store.
    pub fn commit(&self, txn: Transaction) -> Result<()> {
        let verdict = self.conflict.detect(&txn);
        if !verdict.is_ok() {
            log::debug!("txn {} aborted by conflict at commit", txn.id());
            self.finish_aborted(&txn);
            return verdict.into_result();
        }

        for rows in txn.writes().values() {
            for row in rows {
                self.store.append(row.clone());
            }
        }
        self.commit_table.mark_committed(txn.id());
        self.txn_manager.commit(txn.id());
        log::trace!("txn {} committed", txn.id());
        self.garbage_collect();
        Ok(())
    }

    /// ABORT - discard the transaction; its buffer never reaches the store
    pub fn abort(&self, txn: Transaction) {
        log::trace!("txn {} aborted", txn.id());
        self.finish_aborted(&txn);
    }

    /// Drop versions no live snapshot can observe; returns the count
    ///
    /// Runs after every successful commit and is safe to call anytime.
    pub fn garbage_collect(&self) -> usize {
        self.store
            .garbage_collect(self.txn_manager.global_oldest_xmin(), &self.visibility)
    }

    /// The transaction manager (observational)
    pub fn txn_manager(&self) -> &TxnManager {
        &self.txn_manager
    }

    /// The row store (observational)
    pub fn store(&self) -> &RowStore {
        &self.store
    }

    /// The commit table (observational)
    pub fn commit_table(&self) -> &CommitTable {
        &self.commit_table
    }

    fn finish_aborted(&self, txn: &Transaction) {
        self.commit_table.mark_aborted(txn.id());
        self.txn_manager.abort(txn.id());
    }

    /// First committed version of `key` visible to `txn`
    fn visible_version(&self, txn: &Transaction, key: &str) -> Result<VersionedRow> {
        let versions = self.store.all_versions(key);
        if versions.is_empty() {
            return Err(EngineError::KeyNotFound(key.to_string()));
        }
        versions
            .into_iter()
            .find(|v| self.visibility.is_visible(v, txn.snapshot()))
            .ok_or_else(|| EngineError::KeyNotVisible(key.to_string()))
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

/// Shallow right-biased overlay of `overlay` onto `base`
fn merge_row(base: &Row, overlay: Row) -> Row {
    let mut merged = base.clone();
    merged.extend(overlay);
    merged
}

// ============================================================================
// Tests
// ============================================================================
