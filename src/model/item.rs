use serde::{Deserialize, Serialize};

/// Execution state of a checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChecklistItemState {
    /// Not yet started (serialized as the empty string on the wire)
    #[default]
    #[serde(rename = "")]
    Open,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "closed")]
    Closed,
    /// Explicitly excused from completion; terminal, distinct from Closed
    #[serde(rename = "skipped")]
    Skip,
}

impl ChecklistItemState {
    /// Terminal states admit no further transitions from within the engine.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ChecklistItemState::Closed | ChecklistItemState::Skip
        )
    }
}

/// The effect the governing condition currently has on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionAction {
    /// No condition has been resolved against this item
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "shown")]
    Shown,
}

/// A single task unit within a checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Opaque identifier, unique within a run
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: ChecklistItemState,
    /// Epoch millis of the last state transition (0 = never transitioned)
    #[serde(default)]
    pub state_modified: i64,
    /// Post that triggered the last transition (empty = none)
    #[serde(default)]
    pub state_modified_post_id: String,
    /// Assigned user (empty = unassigned; weak reference, not ownership)
    #[serde(default)]
    pub assignee_id: String,
    /// Executable action (empty = none)
    #[serde(default)]
    pub command: String,
    /// Epoch millis of the last command run (0 = never run)
    #[serde(default)]
    pub command_last_run: i64,
    /// Epoch millis; 0 means no due date
    #[serde(default)]
    pub due_date: i64,
    /// Condition governing visibility (empty = unconditional).
    /// Must reference a condition attached to the same checklist.
    #[serde(default)]
    pub condition_id: String,
    #[serde(default)]
    pub condition_action: ConditionAction,
}

impl ChecklistItem {
    /// Create a new open item with the given id and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        ChecklistItem {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            state: ChecklistItemState::Open,
            state_modified: 0,
            state_modified_post_id: String::new(),
            assignee_id: String::new(),
            command: String::new(),
            command_last_run: 0,
            due_date: 0,
            condition_id: String::new(),
            condition_action: ConditionAction::None,
        }
    }

    pub fn has_command(&self) -> bool {
        !self.command.is_empty()
    }

    /// Whether the governing condition currently hides this item
    pub fn is_hidden(&self) -> bool {
        self.condition_action == ConditionAction::Hidden
    }

    /// Overdue: due date set, in the past, and the item still outstanding
    pub fn is_overdue(&self, now: i64) -> bool {
        self.due_date > 0 && self.due_date <= now && !self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_format() {
        let json = serde_json::to_string(&ChecklistItemState::Open).unwrap();
        assert_eq!(json, "\"\"");
        let json = serde_json::to_string(&ChecklistItemState::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let state: ChecklistItemState = serde_json::from_str("\"skipped\"").unwrap();
        assert_eq!(state, ChecklistItemState::Skip);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ChecklistItemState::Open.is_terminal());
        assert!(!ChecklistItemState::InProgress.is_terminal());
        assert!(ChecklistItemState::Closed.is_terminal());
        assert!(ChecklistItemState::Skip.is_terminal());
    }

    #[test]
    fn test_overdue() {
        let mut item = ChecklistItem::new("t1", "Check backups");
        assert!(!item.is_overdue(1000)); // no due date

        item.due_date = 500;
        assert!(item.is_overdue(1000));
        assert!(!item.is_overdue(499)); // not yet due

        item.state = ChecklistItemState::Closed;
        assert!(!item.is_overdue(1000)); // closed items are never overdue

        item.state = ChecklistItemState::Skip;
        assert!(!item.is_overdue(1000));
    }

    #[test]
    fn test_item_serde_defaults() {
        let item: ChecklistItem =
            serde_json::from_str(r#"{"id":"t1","title":"Page on-call"}"#).unwrap();
        assert_eq!(item.state, ChecklistItemState::Open);
        assert_eq!(item.assignee_id, "");
        assert_eq!(item.due_date, 0);
        assert_eq!(item.condition_action, ConditionAction::None);
    }
}
