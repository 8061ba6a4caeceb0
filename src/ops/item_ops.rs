use tracing::debug;

use crate::model::item::{ChecklistItem, ChecklistItemState};
use crate::ops::EngineError;

// ---------------------------------------------------------------------------
// State transitions
// ---------------------------------------------------------------------------

/// Direct validated state set — the single place the state machine is
/// enumerated. A transition to the current state is a successful no-op.
///
/// Legal edges:
///   Open -> InProgress
///   InProgress -> Closed
///   Open -> Closed            (command items only; the command run closes
///                              the item with no observable in-progress step)
///   Open | InProgress -> Skip
///
/// Nothing leaves Closed or Skip; reopening is issued by the collaborating
/// run-management system by replacing the run structure, not through here.
pub fn set_state(
    item: &mut ChecklistItem,
    new_state: ChecklistItemState,
    now: i64,
    post_id: &str,
) -> Result<(), EngineError> {
    use ChecklistItemState::*;

    if item.state == new_state {
        return Ok(());
    }

    let allowed = match (item.state, new_state) {
        (Open, InProgress) => true,
        (InProgress, Closed) => true,
        (Open, Closed) => item.has_command(),
        (Open, Skip) | (InProgress, Skip) => true,
        _ => false,
    };
    if !allowed {
        return Err(EngineError::InvalidTransition {
            from: item.state,
            to: new_state,
        });
    }

    debug!(item = %item.id, from = ?item.state, to = ?new_state, "item transition");
    item.state = new_state;
    item.state_modified = now;
    item.state_modified_post_id = post_id.to_string();
    Ok(())
}

/// Advance one step: Open -> InProgress -> Closed.
///
/// Command items do not advance out of Open — they close through
/// [`run_command`] instead.
pub fn advance(
    item: &mut ChecklistItem,
    now: i64,
    post_id: &str,
) -> Result<(), EngineError> {
    let next = match item.state {
        ChecklistItemState::Open if item.has_command() => {
            return Err(EngineError::InvalidTransition {
                from: item.state,
                to: ChecklistItemState::InProgress,
            });
        }
        ChecklistItemState::Open => ChecklistItemState::InProgress,
        ChecklistItemState::InProgress => ChecklistItemState::Closed,
        terminal => {
            return Err(EngineError::InvalidTransition {
                from: terminal,
                to: ChecklistItemState::Closed,
            });
        }
    };
    set_state(item, next, now, post_id)
}

/// Run the item's command and close it atomically. Also stamps
/// `command_last_run`; the command execution itself is a collaborator
/// concern.
pub fn run_command(
    item: &mut ChecklistItem,
    now: i64,
    post_id: &str,
) -> Result<(), EngineError> {
    if !item.has_command() {
        return Err(EngineError::InvariantViolation(format!(
            "item {} has no command to run",
            item.id
        )));
    }
    set_state(item, ChecklistItemState::Closed, now, post_id)?;
    item.command_last_run = now;
    Ok(())
}

/// Skip: excuse the item from completion (Open | InProgress -> Skip)
pub fn skip(item: &mut ChecklistItem, now: i64, post_id: &str) -> Result<(), EngineError> {
    set_state(item, ChecklistItemState::Skip, now, post_id)
}

// ---------------------------------------------------------------------------
// Item edits
// ---------------------------------------------------------------------------

/// Assign the item to a user (empty id = unassign). Idempotent.
pub fn set_assignee(item: &mut ChecklistItem, assignee_id: &str) {
    if item.assignee_id == assignee_id {
        return;
    }
    item.assignee_id = assignee_id.to_string();
}

/// Set or clear the due date (0 = no due date)
pub fn set_due_date(item: &mut ChecklistItem, due_date: i64) {
    item.due_date = due_date;
}

/// Replace the item's command. Changing the command text resets
/// `command_last_run` since the previous run no longer applies.
pub fn set_command(item: &mut ChecklistItem, command: &str) {
    if item.command == command {
        return;
    }
    item.command = command.to_string();
    item.command_last_run = 0;
}

pub fn edit_title(item: &mut ChecklistItem, title: &str) {
    item.title = title.to_string();
}

pub fn edit_description(item: &mut ChecklistItem, description: &str) {
    item.description = description.to_string();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
