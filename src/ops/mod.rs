pub mod condition_ops;
pub mod filter;
pub mod item_ops;
pub mod reorder;

pub use condition_ops::*;
pub use filter::*;
pub use item_ops::*;
pub use reorder::*;

use crate::model::item::ChecklistItemState;
use crate::sync::SyncError;

/// Error taxonomy for engine operations.
///
/// Every rejection leaves the structure untouched: operations validate
/// before committing and never partial-apply.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Attempted state change violates the item state machine
    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ChecklistItemState,
        to: ChecklistItemState,
    },
    /// Acting user lacks modify permission on the run
    #[error("permission denied for user {user_id}")]
    PermissionDenied { user_id: String },
    /// Operation would break a structural invariant
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The persistence call failed after the optimistic local update.
    /// The in-memory structure stands; reverting is a caller policy.
    #[error(transparent)]
    SyncFailure(#[from] SyncError),
}
