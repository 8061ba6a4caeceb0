use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::checklist::Checklist;
use crate::model::item::{ChecklistItem, ChecklistItemState};
use crate::ops::EngineError;

/// User-selected view restricting which items are displayed, without
/// altering the underlying data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsFilter {
    /// Show everything (except condition-hidden items)
    pub all: bool,
    /// Show closed tasks
    pub checked: bool,
    /// Show skipped tasks
    pub skipped: bool,
    /// Show tasks assigned to the current user
    pub me: bool,
    /// Show unassigned tasks
    pub unassigned: bool,
    /// Show tasks assigned to other users
    pub others: bool,
    /// Show only overdue tasks
    pub overdue_only: bool,
}

impl Default for ItemsFilter {
    fn default() -> Self {
        ItemsFilter {
            all: false,
            checked: true,
            skipped: true,
            me: true,
            unassigned: true,
            others: true,
            overdue_only: false,
        }
    }
}

/// Addressable toggles of the filter, for the guarded mutation entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOption {
    All,
    Checked,
    Skipped,
    Me,
    Unassigned,
    Others,
    OverdueOnly,
}

impl FilterOption {
    fn is_assignee_toggle(self) -> bool {
        matches!(
            self,
            FilterOption::Me | FilterOption::Unassigned | FilterOption::Others
        )
    }
}

// ---------------------------------------------------------------------------
// Visibility predicate
// ---------------------------------------------------------------------------

/// Whether the item is displayed under the given filter. The checks run
/// in a fixed order; a condition-hidden item is never shown, regardless
/// of any other setting including `all`.
pub fn should_show(
    item: &ChecklistItem,
    filter: &ItemsFilter,
    current_user_id: &str,
    now: i64,
) -> bool {
    if item.is_hidden() {
        return false;
    }
    if filter.all {
        return true;
    }
    if !filter.checked && item.state == ChecklistItemState::Closed {
        return false;
    }
    if !filter.skipped && item.state == ChecklistItemState::Skip {
        return false;
    }
    if !filter.me && item.assignee_id == current_user_id {
        return false;
    }
    if !filter.unassigned && item.assignee_id.is_empty() {
        return false;
    }
    if !filter.others && !item.assignee_id.is_empty() && item.assignee_id != current_user_id {
        return false;
    }
    if filter.overdue_only {
        return item.is_overdue(now);
    }
    true
}

/// Whether the checklist has any visible item under the filter
pub fn visible_tasks(
    checklist: &Checklist,
    filter: &ItemsFilter,
    current_user_id: &str,
    now: i64,
) -> bool {
    checklist
        .items
        .iter()
        .any(|item| should_show(item, filter, current_user_id, now))
}

// ---------------------------------------------------------------------------
// Guarded mutation
// ---------------------------------------------------------------------------

/// Set one filter toggle. Two guards apply:
///
/// - while `all` is active, the individual toggles are frozen (a
///   successful no-op, mirroring their disabled state in the UI);
/// - the assignee trio {me, unassigned, others} may never reach
///   all-false — unchecking the last active one is rejected, so a filter
///   can't silently hide every item.
pub fn set_option(
    filter: &mut ItemsFilter,
    option: FilterOption,
    value: bool,
) -> Result<(), EngineError> {
    if filter.all && option != FilterOption::All {
        return Ok(());
    }
    if !value && option.is_assignee_toggle() && is_last_checked_assignee(filter, option) {
        return Err(EngineError::InvariantViolation(
            "at least one assignee filter must stay selected".into(),
        ));
    }

    match option {
        FilterOption::All => filter.all = value,
        FilterOption::Checked => filter.checked = value,
        FilterOption::Skipped => filter.skipped = value,
        FilterOption::Me => filter.me = value,
        FilterOption::Unassigned => filter.unassigned = value,
        FilterOption::Others => filter.others = value,
        FilterOption::OverdueOnly => filter.overdue_only = value,
    }
    Ok(())
}

/// True when `option` is the only assignee toggle still checked
fn is_last_checked_assignee(filter: &ItemsFilter, option: FilterOption) -> bool {
    let checked = [filter.me, filter.unassigned, filter.others]
        .iter()
        .filter(|v| **v)
        .count();
    let current = match option {
        FilterOption::Me => filter.me,
        FilterOption::Unassigned => filter.unassigned,
        FilterOption::Others => filter.others,
        _ => return false,
    };
    checked == 1 && current
}

// ---------------------------------------------------------------------------
// Overdue handling
// ---------------------------------------------------------------------------

/// Count of outstanding items with a past due date, across the run
pub fn overdue_count(checklists: &[Checklist], now: i64) -> usize {
    checklists
        .iter()
        .flat_map(|cl| cl.items.iter())
        .filter(|item| item.is_overdue(now))
        .count()
}

/// Clear `overdue_only` once nothing is overdue anymore. Called on each
/// evaluation pass so the filter doesn't strand the user on an empty view.
pub fn auto_reset_overdue(filter: &mut ItemsFilter, checklists: &[Checklist], now: i64) {
    if filter.overdue_only && overdue_count(checklists, now) == 0 {
        debug!("no overdue tasks remain, clearing overdue-only filter");
        filter.overdue_only = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
