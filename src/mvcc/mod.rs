//! MVCC (Multi-Version Concurrency Control) subsystem
//!
//! Enables concurrent transactions without blocking:
//! - Readers see a consistent snapshot taken at their BEGIN
//! - Writers buffer new versions and publish them at commit
//! - Garbage collection removes versions no live snapshot can observe
//!
//! Architecture:
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  RowStore                                        │
//! │  - Ordered version list per key                  │
//! │  - Each version: (xmin, xmax, data)              │
//! ├──────────────────────────────────────────────────┤
//! │  VisibilityEngine                                │
//! │  - Decides version visibility per snapshot       │
//! │  - Decides collectability per GC horizon         │
//! ├──────────────────────────────────────────────────┤
//! │  Snapshot                                        │
//! │  - Frozen transaction universe at BEGIN          │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod snapshot;
pub mod version_store;
pub mod visibility;

pub use snapshot::Snapshot;
pub use version_store::{RowStore, VersionedRow};
pub use visibility::VisibilityEngine;
