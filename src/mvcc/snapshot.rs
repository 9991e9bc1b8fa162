//! Snapshot - Frozen view of the transaction universe at BEGIN
//!
//! Every transaction captures one of these when it starts. All visibility
//! decisions for the transaction are made against this value; it is never
//! mutated afterwards.

use std::collections::HashSet;

use crate::txn::TxnId;

/// A point-in-time snapshot for consistent reads
///
/// Field invariants: `xmin <= xmax`, `txn_id == xmax`, the owner is never in
/// `active`, and every member of `active` is strictly below `xmax`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Smallest transaction id still in progress at BEGIN (`xmax` if none)
    pub xmin: TxnId,
    /// The id assigned at BEGIN; ids at or above this are invisible
    pub xmax: TxnId,
    /// Ids strictly below `xmax` that were in progress at BEGIN (owner excluded)
    pub active: HashSet<TxnId>,
    /// The owning transaction's id (equals `xmax`)
    pub txn_id: TxnId,
}

impl Snapshot {
    /// Create a snapshot from its raw parts
    pub fn new(xmin: TxnId, xmax: TxnId, active: HashSet<TxnId>, txn_id: TxnId) -> Self {
        Self {
            xmin,
            xmax,
            active,
            txn_id,
        }
    }

    /// Whether `tid` was in progress when this snapshot was taken
    pub fn is_active(&self, tid: TxnId) -> bool {
        self.active.contains(&tid)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let snap = Snapshot::new(2, 5, HashSet::from([2, 4]), 5);
        assert_eq!(snap.xmin, 2);
        assert_eq!(snap.xmax, 5);
        assert_eq!(snap.txn_id, 5);
        assert!(snap.is_active(2));
        assert!(snap.is_active(4));
        assert!(!snap.is_active(3));
    }

    #[test]
    fn test_owner_not_in_active() {
        let snap = Snapshot::new(3, 7, HashSet::from([3, 5]), 7);
        assert!(!snap.is_active(snap.txn_id));
    }
}
