//! Commit Table - Terminal status registry for transaction ids
//!
//! A transaction id lands in at most one of the two sets; an id in neither
//! is still in progress. Disjointness is an invariant of the call sites,
//! not checked here.

use std::collections::HashSet;

use parking_lot::RwLock;

use super::manager::TxnId;

/// Records the terminal status (committed or aborted) of transaction ids
#[derive(Debug, Default)]
pub struct CommitTable {
    committed: RwLock<HashSet<TxnId>>,
    aborted: RwLock<HashSet<TxnId>>,
}

impl CommitTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tid` as committed
    pub fn mark_committed(&self, tid: TxnId) {
        self.committed.write().insert(tid);
    }

    /// Record `tid` as aborted
    pub fn mark_aborted(&self, tid: TxnId) {
        self.aborted.write().insert(tid);
    }

    /// Whether `tid` committed
    pub fn is_committed(&self, tid: TxnId) -> bool {
        self.committed.read().contains(&tid)
    }

    /// Whether `tid` aborted
    pub fn is_aborted(&self, tid: TxnId) -> bool {
        self.aborted.read().contains(&tid)
    }

    /// Whether `tid` has reached no terminal status yet
    pub fn is_in_progress(&self, tid: TxnId) -> bool {
        !self.is_committed(tid) && !self.is_aborted(tid)
    }

    /// Number of committed ids
    pub fn committed_count(&self) -> usize {
        self.committed.read().len()
    }

    /// Number of aborted ids
    pub fn aborted_count(&self) -> usize {
        self.aborted.read().len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_status() {
        let table = CommitTable::new();
        assert!(table.is_in_progress(1));

        table.mark_committed(1);
        assert!(table.is_committed(1));
        assert!(!table.is_aborted(1));
        assert!(!table.is_in_progress(1));

        table.mark_aborted(2);
        assert!(table.is_aborted(2));
        assert!(!table.is_committed(2));
        assert!(!table.is_in_progress(2));
    }

    #[test]
    fn test_counts() {
        let table = CommitTable::new();
        table.mark_committed(1);
        table.mark_committed(2);
        table.mark_aborted(3);
        assert_eq!(table.committed_count(), 2);
        assert_eq!(table.aborted_count(), 1);
    }
}
