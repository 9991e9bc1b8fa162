//! Visibility Engine - Decides which row versions a snapshot can observe
//!
//! Pure decision functions over a version's creator/deleter stamps, the
//! reader's snapshot, and the commit table. Also owns the collectability
//! predicate used by GC.

use std::sync::Arc;

use crate::mvcc::snapshot::Snapshot;
use crate::mvcc::version_store::VersionedRow;
use crate::txn::commit_table::CommitTable;
use crate::txn::TxnId;

/// Visibility predicate bound to the commit registry
///
/// Holds no mutable state of its own; every answer is a function of the
/// arguments and the registry's current contents.
pub struct VisibilityEngine {
    commit_table: Arc<CommitTable>,
}

impl VisibilityEngine {
    /// Create an engine reading terminal statuses from `commit_table`
    pub fn new(commit_table: Arc<CommitTable>) -> Self {
        Self { commit_table }
    }

    /// Whether `row` is observable from `snapshot`
    pub fn is_visible(&self, row: &VersionedRow, snapshot: &Snapshot) -> bool {
        // Own writes: visible unless we deleted it ourselves
        if row.xmin == snapshot.txn_id {
            return row.xmax != Some(snapshot.txn_id);
        }
        if !self.txn_visible(row.xmin, snapshot) {
            return false;
        }
        match row.xmax {
            None => true,
            // An invisible deletion has not happened for this snapshot
            Some(deleter) => !self.txn_visible(deleter, snapshot),
        }
    }

    /// Whether transaction `tid`'s effects are visible from `snapshot`
    ///
    /// Note: a transaction at or beyond the snapshot's horizon is answered
    /// without consulting the registry, even if it aborted. No snapshot
    /// older than such a transaction can have observed its versions, so the
    /// shortcut never misreports a reachable row.
    pub fn txn_visible(&self, tid: TxnId, snapshot: &Snapshot) -> bool {
        if tid >= snapshot.xmax {
            // Started after this snapshot
            return false;
        }
        if snapshot.active.contains(&tid) {
            // In progress at snapshot time
            return false;
        }
        self.commit_table.is_committed(tid)
    }

    /// Whether `row` can be dropped once no live snapshot reaches below
    /// `oldest_xmin`
    ///
    /// An undeleted version is never collectable; a deleted one needs both
    /// its creator and its deleter below the horizon.
    pub fn can_collect(&self, row: &VersionedRow, oldest_xmin: TxnId) -> bool {
        match row.xmax {
            None => false,
            Some(xmax) => row.xmin < oldest_xmin && xmax < oldest_xmin,
        }
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

    fn engine_with(committed: &[TxnId], aborted: &[TxnId]) -> VisibilityEngine {
        let table = CommitTable::new();
        for &t in committed {
            table.mark_committed(t);
        }
        for &t in aborted {
            table.mark_aborted(t);
        }
        VisibilityEngine::new(Arc::new(table))
    }

    fn row(xmin: TxnId, xmax: Option<TxnId>) -> VersionedRow {
        VersionedRow {
            key: "k".to_string(),
            data: Row::new(),
            xmin,
            xmax,
        }
    }

    fn snap(xmin: TxnId, xmax: TxnId, active: &[TxnId]) -> Snapshot {
        Snapshot::new(xmin, xmax, active.iter().copied().collect::<HashSet<_>>(), xmax)
    }

    #[test]
    fn test_own_insert_visible() {
        let engine = engine_with(&[], &[]);
        let snap = snap(5, 5, &[]);
        assert!(engine.is_visible(&row(5, None), &snap));
    }

    #[test]
    fn test_own_insert_deleted_by_self_invisible() {
        let engine = engine_with(&[], &[]);
        let snap = snap(5, 5, &[]);
        assert!(!engine.is_visible(&row(5, Some(5)), &snap));
    }

    #[test]
    fn test_committed_creator_visible() {
        let engine = engine_with(&[1], &[]);
        let snap = snap(5, 5, &[]);
        assert!(engine.is_visible(&row(1, None), &snap));
    }

    #[test]
    fn test_uncommitted_creator_invisible() {
        let engine = engine_with(&[], &[]);
        let snap = snap(5, 5, &[]);
        assert!(!engine.is_visible(&row(1, None), &snap));
    }

    #[test]
    fn test_aborted_creator_invisible() {
        let engine = engine_with(&[], &[1]);
        let snap = snap(5, 5, &[]);
        assert!(!engine.is_visible(&row(1, None), &snap));
    }

    #[test]
    fn test_active_check_dominates_numeric_check() {
        // A committed creator whose id is below xmax but who was still in
        // progress at snapshot time must stay invisible.
        let engine = engine_with(&[3], &[]);
        let snap = snap(3, 5, &[3]);
        assert!(!engine.txn_visible(3, &snap));
        assert!(!engine.is_visible(&row(3, None), &snap));
    }

    #[test]
    fn test_creator_beyond_horizon_invisible() {
        let engine = engine_with(&[7], &[]);
        let snap = snap(5, 5, &[]);
        assert!(!engine.txn_visible(7, &snap));
        assert!(!engine.is_visible(&row(7, None), &snap));
    }

    #[test]
    fn test_committed_deletion_hides_row() {
        let engine = engine_with(&[1, 2], &[]);
        let snap = snap(5, 5, &[]);
        assert!(!engine.is_visible(&row(1, Some(2)), &snap));
    }

    #[test]
    fn test_deletion_by_active_txn_not_yet_happened() {
        let engine = engine_with(&[1, 2], &[]);
        // Deleter 2 committed after we began: it is still in our active set
        let snap = snap(2, 3, &[2]);
        assert!(engine.is_visible(&row(1, Some(2)), &snap));
    }

    #[test]
    fn test_deletion_beyond_horizon_not_yet_happened() {
        // The registry is not consulted for a deleter at or beyond xmax:
        // committed or aborted, the deletion is not observable from here.
        let committed_deleter = engine_with(&[1, 9], &[]);
        let aborted_deleter = engine_with(&[1], &[9]);
        let snap = snap(5, 5, &[]);
        assert!(committed_deleter.is_visible(&row(1, Some(9)), &snap));
        assert!(aborted_deleter.is_visible(&row(1, Some(9)), &snap));
    }

    #[test]
    fn test_can_collect_bounds() {
        let engine = engine_with(&[], &[]);
        // Undeleted: never collectable
        assert!(!engine.can_collect(&row(1, None), 100));
        // Both creator and deleter below the horizon
        assert!(engine.can_collect(&row(1, Some(2)), 3));
        // Creator at the horizon
        assert!(!engine.can_collect(&row(3, Some(4)), 3));
        // Deleter at the horizon
        assert!(!engine.can_collect(&row(1, Some(3)), 3));
    }
}
