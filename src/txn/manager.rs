//! Transaction Manager - Id allocation and the active transaction table
//!
//! Assigns strictly increasing transaction ids, builds each transaction's
//! snapshot at BEGIN, and tracks which transactions are in progress. The
//! minimum `xmin` across active snapshots bounds what GC may drop.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::mvcc::snapshot::Snapshot;

use super::transaction::Transaction;

/// Unique transaction identifier
pub type TxnId = u64;

/// Allocates monotone transaction ids and tracks the in-progress set
pub struct TxnManager {
    /// Next id to assign
    next_txn_id: AtomicU64,
    /// Active transactions: id → snapshot taken at its BEGIN
    active: RwLock<BTreeMap<TxnId, Snapshot>>,
    /// Total committed transactions (for monitoring)
    total_committed: AtomicU64,
    /// Total aborted transactions (for monitoring)
    total_aborted: AtomicU64,
}

impl TxnManager {
    /// Create a new manager; the first transaction gets id 1
    pub fn new() -> Self {
        Self {
            next_txn_id: AtomicU64::new(1),
            active: RwLock::new(BTreeMap::new()),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
        }
    }

    /// BEGIN - allocate an id, capture the snapshot, register as active
    ///
    /// The active set is read before the new id is inserted, so a
    /// transaction never appears in its own snapshot.
    pub fn begin(&self) -> Transaction {
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        let mut table = self.active.write();
        let active: HashSet<TxnId> = table.keys().copied().filter(|&id| id < txn_id).collect();
        let xmin = active.iter().copied().min().unwrap_or(txn_id);
        let snapshot = Snapshot::new(xmin, txn_id, active, txn_id);
        table.insert(txn_id, snapshot.clone());
        Transaction::new(txn_id, snapshot)
    }

    /// Deregister a committing transaction (registry update is the caller's)
    pub fn commit(&self, txn_id: TxnId) {
        self.active.write().remove(&txn_id);
        self.total_committed.fetch_add(1, Ordering::Relaxed);
    }

    /// Deregister an aborting transaction
    pub fn abort(&self, txn_id: TxnId) {
        self.active.write().remove(&txn_id);
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Cut-off below which no live snapshot can observe anything
    ///
    /// With no transactions active this is the next unassigned id; every
    /// fully terminated version then sits below it.
    pub fn global_oldest_xmin(&self) -> TxnId {
        self.active
            .read()
            .values()
            .map(|s| s.xmin)
            .min()
            .unwrap_or_else(|| self.next_txn_id.load(Ordering::SeqCst))
    }

    /// The next id that will be assigned (no increment)
    pub fn next_txn_id(&self) -> TxnId {
        self.next_txn_id.load(Ordering::SeqCst)
    }

    /// Ids of the transactions currently in progress, ascending
    pub fn active_txns(&self) -> Vec<TxnId> {
        self.active.read().keys().copied().collect()
    }

    /// Number of active transactions
    pub fn active_count(&self) -> usize {
        self.active.read().len()
    }

    /// Whether `txn_id` is in progress
    pub fn is_active(&self, txn_id: TxnId) -> bool {
        self.active.read().contains_key(&txn_id)
    }

    /// Total committed transactions
    pub fn total_committed(&self) -> u64 {
        self.total_committed.load(Ordering::Relaxed)
    }

    /// Total aborted transactions
    pub fn total_aborted(&self) -> u64 {
        self.total_aborted.load(Ordering::Relaxed)
    }
}

impl Default for TxnManager {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
