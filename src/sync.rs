//! Collaborator seams: persistence, permissions, and the logical-version
//! tracking that keeps optimistic local state ahead of late confirmations.
//!
//! The engine mutates in memory first and persists best-effort afterward.
//! Only one logical mutation is in flight per run (all mutations originate
//! from a single serialized event stream); confirmations may still arrive
//! out of order, so they are reconciled by logical version, not arrival
//! order.

use tracing::warn;

use crate::model::checklist::Checklist;
use crate::model::item::ChecklistItemState;
use crate::model::run::PlaybookRun;

/// Failure of an external persistence call. The local optimistic state is
/// kept; reverting or re-fetching is the caller's policy.
#[derive(Debug, Clone, thiserror::Error)]
#[error("persistence call failed: {message}")]
pub struct SyncError {
    pub message: String,
}

impl SyncError {
    pub fn new(message: impl Into<String>) -> Self {
        SyncError {
            message: message.into(),
        }
    }
}

/// Persistence/sync collaborator. Transport is not this crate's concern.
pub trait RunStore {
    fn fetch_run(&self, run_id: &str) -> Result<PlaybookRun, SyncError>;
    fn save_checklists(&self, run_id: &str, checklists: &[Checklist]) -> Result<(), SyncError>;
    fn transition_item(
        &self,
        run_id: &str,
        checklist_idx: usize,
        item_idx: usize,
        new_state: ChecklistItemState,
    ) -> Result<(), SyncError>;
}

/// Permission collaborator, consulted before any mutation
pub trait PermissionGuard {
    fn can_modify(&self, run: &PlaybookRun, user_id: &str) -> bool;
    fn can_admin(&self, run: &PlaybookRun, user_id: &str) -> bool;
}

/// Outcome of reconciling a persistence confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The confirmation matches the newest local mutation; server-echoed
    /// state may be applied.
    Applied,
    /// A newer local mutation superseded this confirmation; its payload
    /// must not clobber the in-memory structure.
    Stale,
}

/// Monotonic logical version per run. Every local mutation takes the next
/// version; a confirmation only wins if it carries the newest one.
#[derive(Debug, Clone, Default)]
pub struct SyncTracker {
    committed: u64,
}

impl SyncTracker {
    pub fn new() -> Self {
        SyncTracker::default()
    }

    /// Record a local mutation; returns its logical version
    pub fn begin(&mut self) -> u64 {
        self.committed += 1;
        self.committed
    }

    /// Version of the newest local mutation (0 = none yet)
    pub fn current(&self) -> u64 {
        self.committed
    }

    /// Reconcile a confirmation that arrived for `version`
    pub fn acknowledge(&self, version: u64) -> Ack {
        if version == self.committed {
            Ack::Applied
        } else {
            warn!(
                version,
                current = self.committed,
                "stale persistence confirmation ignored"
            );
            Ack::Stale
        }
    }
}
