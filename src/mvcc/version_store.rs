//! Version Store - Per-key row version lists for MVCC
//!
//! Each key maps to an ordered list of versions. Every version carries the
//! id of the transaction that created it (`xmin`) and, once logically
//! deleted, the id of the deleter (`xmax`). Visibility is decided elsewhere
//! by comparing those stamps against a reader's snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::data::Row;
use crate::mvcc::visibility::VisibilityEngine;
use crate::txn::TxnId;

// ============================================================================
// Versioned Row
// ============================================================================

/// A single version of a keyed row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedRow {
    /// Row key
    pub key: String,
    /// The row payload
    pub data: Row,
    /// Transaction that created this version
    pub xmin: TxnId,
    /// Transaction that deleted this version, if any
    pub xmax: Option<TxnId>,
}

impl VersionedRow {
    /// Create an undeleted version stamped with its creator
    pub fn new(key: impl Into<String>, data: Row, xmin: TxnId) -> Self {
        Self {
            key: key.into(),
            data,
            xmin,
            xmax: None,
        }
    }

    /// Copy of this version marked deleted by `deleter`
    ///
    /// The creator stamp is preserved so GC bounds stay meaningful.
    pub fn tombstone(&self, deleter: TxnId) -> Self {
        Self {
            key: self.key.clone(),
            data: self.data.clone(),
            xmin: self.xmin,
            xmax: Some(deleter),
        }
    }

    /// Whether this version carries a deletion stamp
    pub fn is_tombstone(&self) -> bool {
        self.xmax.is_some()
    }
}

// ============================================================================
// Row Store
// ============================================================================

/// Central store for all committed row versions
///
/// Per-key version lists preserve insertion order. Mutation is synchronous
/// with respect to reads; callers serialize operations.
pub struct RowStore {
    /// Key → versions in insertion order
    rows: RwLock<HashMap<String, Vec<VersionedRow>>>,
    /// Running count of versions dropped by GC
    total_collected: AtomicU64,
}

impl RowStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            total_collected: AtomicU64::new(0),
        }
    }

    /// Add a committed version under its key
    ///
    /// A row carrying a deletion stamp replaces the live entry it deletes
    /// (same `xmin`, no `xmax`) in place; anything else is appended. The
    /// in-place replacement is what marks a prior version deleted at commit.
    pub fn append(&self, row: VersionedRow) {
        let mut rows = self.rows.write();
        let versions = rows.entry(row.key.clone()).or_default();
        if row.is_tombstone() {
            if let Some(live) = versions
                .iter_mut()
                .find(|v| v.xmin == row.xmin && v.xmax.is_none())
            {
                *live = row;
                return;
            }
        }
        versions.push(row);
    }

    /// All versions under `key`, in insertion order (empty if unknown key)
    pub fn all_versions(&self, key: &str) -> Vec<VersionedRow> {
        self.rows.read().get(key).cloned().unwrap_or_default()
    }

    /// The most recently inserted version under `key`
    pub fn latest(&self, key: &str) -> Option<VersionedRow> {
        self.rows.read().get(key).and_then(|v| v.last().cloned())
    }

    /// All keys currently holding at least one version
    pub fn all_keys(&self) -> Vec<String> {
        self.rows.read().keys().cloned().collect()
    }

    /// Number of versions under `key`
    pub fn version_count(&self, key: &str) -> usize {
        self.rows.read().get(key).map(|v| v.len()).unwrap_or(0)
    }

    /// Total version records across all keys
    pub fn total_versions(&self) -> usize {
        self.rows.read().values().map(|v| v.len()).sum()
    }

    /// Number of tracked keys
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// Drop every version no snapshot at or above `oldest_xmin` can observe
    ///
    /// Keys left without versions are removed. Returns the number of
    /// versions dropped.
    pub fn garbage_collect(&self, oldest_xmin: TxnId, visibility: &VisibilityEngine) -> usize {
        let mut rows = self.rows.write();
        let mut dropped = 0;
        for versions in rows.values_mut() {
            let before = versions.len();
            versions.retain(|v| !visibility.can_collect(v, oldest_xmin));
            dropped += before - versions.len();
        }
        rows.retain(|_, versions| !versions.is_empty());
        if dropped > 0 {
            self.total_collected.fetch_add(dropped as u64, Ordering::Relaxed);
            log::debug!("gc dropped {} versions below xmin {}", dropped, oldest_xmin);
        }
        dropped
    }

    /// Versions dropped across all GC runs
    pub fn total_collected(&self) -> u64 {
        self.total_collected.load(Ordering::Relaxed)
    }
}

impl Default for RowStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
