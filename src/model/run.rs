use serde::{Deserialize, Serialize};

use super::checklist::Checklist;
use super::item::ChecklistItemState;

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunStatus {
    #[default]
    InProgress,
    Finished,
}

/// A live instantiation of a checklist template being executed.
///
/// The run owns its checklists; all structural mutation goes through the
/// ops layer so that the ordering and condition invariants hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookRun {
    /// Opaque identifier
    pub id: String,
    pub name: String,
    /// User who owns the run (weak reference)
    #[serde(default)]
    pub owner_user_id: String,
    #[serde(default)]
    pub current_status: RunStatus,
    #[serde(default)]
    pub checklists: Vec<Checklist>,
}

impl PlaybookRun {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        PlaybookRun {
            id: id.into(),
            name: name.into(),
            owner_user_id: String::new(),
            current_status: RunStatus::InProgress,
            checklists: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_status == RunStatus::Finished
    }

    /// Count of outstanding items whose due date has passed, across all
    /// checklists in the run.
    pub fn overdue_count(&self, now: i64) -> usize {
        self.checklists
            .iter()
            .flat_map(|cl| cl.items.iter())
            .filter(|item| item.is_overdue(now))
            .count()
    }

    /// True when every visible, non-skipped item is closed.
    pub fn all_complete(&self) -> bool {
        self.checklists
            .iter()
            .flat_map(|cl| cl.items.iter())
            .filter(|item| !item.is_hidden() && item.state != ChecklistItemState::Skip)
            .all(|item| item.state == ChecklistItemState::Closed)
    }
}
