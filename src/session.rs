//! Guarded mutation entry points over a run.
//!
//! Every entry point applies the same discipline: reject if the run is
//! finished, reject if the user lacks modify permission, validate and
//! apply the pure mutation, then persist best-effort. A persistence
//! failure surfaces as [`EngineError::SyncFailure`] while the optimistic
//! in-memory state stands — reverting or re-fetching is the caller's
//! policy, typically via [`RunSession::reload`].

use chrono::Utc;
use tracing::{debug, warn};

use crate::model::checklist::Checklist;
use crate::model::item::{ChecklistItem, ChecklistItemState};
use crate::model::run::PlaybookRun;
use crate::ops::item_ops;
use crate::ops::reorder::{self, ChecklistMove, ItemMove};
use crate::ops::EngineError;
use crate::sync::{Ack, PermissionGuard, RunStore, SyncTracker};

pub struct RunSession<S: RunStore, P: PermissionGuard> {
    run: PlaybookRun,
    store: S,
    permissions: P,
    tracker: SyncTracker,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl<S: RunStore, P: PermissionGuard> RunSession<S, P> {
    pub fn new(run: PlaybookRun, store: S, permissions: P) -> Self {
        RunSession {
            run,
            store,
            permissions,
            tracker: SyncTracker::new(),
        }
    }

    pub fn run(&self) -> &PlaybookRun {
        &self.run
    }

    /// Logical version of the newest local mutation
    pub fn version(&self) -> u64 {
        self.tracker.current()
    }

    /// Reconcile a persistence confirmation that arrived for `version`
    pub fn acknowledge(&self, version: u64) -> Ack {
        self.tracker.acknowledge(version)
    }

    /// Replace the in-memory run from the store (caller revert policy)
    pub fn reload(&mut self) -> Result<(), EngineError> {
        self.run = self.store.fetch_run(&self.run.id)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    fn guard_modify(&self, user_id: &str) -> Result<(), EngineError> {
        if self.run.is_finished() {
            return Err(EngineError::InvariantViolation(format!(
                "run {} is finished",
                self.run.id
            )));
        }
        if !self.permissions.can_modify(&self.run, user_id) {
            return Err(EngineError::PermissionDenied {
                user_id: user_id.to_string(),
            });
        }
        Ok(())
    }

    fn item_coords(&self, checklist_idx: usize, item_idx: usize) -> Result<(), EngineError> {
        let valid = self
            .run
            .checklists
            .get(checklist_idx)
            .is_some_and(|cl| item_idx < cl.items.len());
        if valid {
            Ok(())
        } else {
            Err(EngineError::InvariantViolation(format!(
                "no item at checklist {} index {}",
                checklist_idx, item_idx
            )))
        }
    }

    // -----------------------------------------------------------------------
    // Item state transitions
    // -----------------------------------------------------------------------

    /// Advance the item one step (Open -> InProgress -> Closed)
    pub fn advance_item(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        item_idx: usize,
        post_id: &str,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        self.item_coords(checklist_idx, item_idx)?;

        let item = &mut self.run.checklists[checklist_idx].items[item_idx];
        item_ops::advance(item, now_millis(), post_id)?;
        let new_state = item.state;
        self.persist_transition(checklist_idx, item_idx, new_state)
    }

    /// Run the item's command, closing it atomically
    pub fn run_item_command(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        item_idx: usize,
        post_id: &str,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        self.item_coords(checklist_idx, item_idx)?;

        let item = &mut self.run.checklists[checklist_idx].items[item_idx];
        item_ops::run_command(item, now_millis(), post_id)?;
        self.persist_transition(checklist_idx, item_idx, ChecklistItemState::Closed)
    }

    /// Excuse the item from completion
    pub fn skip_item(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        item_idx: usize,
        post_id: &str,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        self.item_coords(checklist_idx, item_idx)?;

        let item = &mut self.run.checklists[checklist_idx].items[item_idx];
        item_ops::skip(item, now_millis(), post_id)?;
        self.persist_transition(checklist_idx, item_idx, ChecklistItemState::Skip)
    }

    /// Validated direct state set
    pub fn set_item_state(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        item_idx: usize,
        new_state: ChecklistItemState,
        post_id: &str,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        self.item_coords(checklist_idx, item_idx)?;

        let item = &mut self.run.checklists[checklist_idx].items[item_idx];
        item_ops::set_state(item, new_state, now_millis(), post_id)?;
        self.persist_transition(checklist_idx, item_idx, new_state)
    }

    fn persist_transition(
        &mut self,
        checklist_idx: usize,
        item_idx: usize,
        new_state: ChecklistItemState,
    ) -> Result<(), EngineError> {
        let version = self.tracker.begin();
        debug!(run = %self.run.id, version, checklist_idx, item_idx, "persisting transition");
        if let Err(err) =
            self.store
                .transition_item(&self.run.id, checklist_idx, item_idx, new_state)
        {
            warn!(run = %self.run.id, version, %err, "transition persistence failed");
            return Err(err.into());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Item edits
    // -----------------------------------------------------------------------

    /// Assign or unassign the item (empty id = unassign). Idempotent:
    /// assigning the current assignee persists nothing.
    pub fn set_item_assignee(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        item_idx: usize,
        assignee_id: &str,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        self.item_coords(checklist_idx, item_idx)?;

        let item = &mut self.run.checklists[checklist_idx].items[item_idx];
        if item.assignee_id == assignee_id {
            return Ok(());
        }
        item_ops::set_assignee(item, assignee_id);
        self.persist_checklists()
    }

    /// Set or clear the item's due date
    pub fn set_item_due_date(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        item_idx: usize,
        due_date: i64,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        self.item_coords(checklist_idx, item_idx)?;

        item_ops::set_due_date(
            &mut self.run.checklists[checklist_idx].items[item_idx],
            due_date,
        );
        self.persist_checklists()
    }

    /// Append a new item to a checklist
    pub fn add_item(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        item: ChecklistItem,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        let checklist = self.run.checklists.get_mut(checklist_idx).ok_or_else(|| {
            EngineError::InvariantViolation(format!("no checklist at index {}", checklist_idx))
        })?;
        checklist.items.push(item);
        self.persist_checklists()
    }

    /// Edit an item's title and description
    pub fn edit_item(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        item_idx: usize,
        title: &str,
        description: &str,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        self.item_coords(checklist_idx, item_idx)?;

        let item = &mut self.run.checklists[checklist_idx].items[item_idx];
        item_ops::edit_title(item, title);
        item_ops::edit_description(item, description);
        self.persist_checklists()
    }

    // -----------------------------------------------------------------------
    // Structure edits
    // -----------------------------------------------------------------------

    /// Apply a checklist-level reorder
    pub fn move_checklist(
        &mut self,
        user_id: &str,
        mv: ChecklistMove,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        let next = reorder::move_checklist(&self.run.checklists, mv)?;
        self.run.checklists = next;
        self.persist_checklists()
    }

    /// Apply an item-level move, within or across checklists
    pub fn move_item(&mut self, user_id: &str, mv: ItemMove) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        let next = reorder::move_item(&self.run.checklists, mv)?;
        self.run.checklists = next;
        self.persist_checklists()
    }

    /// Append a new checklist
    pub fn add_checklist(&mut self, user_id: &str, title: &str) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        self.run.checklists.push(Checklist::new(title));
        self.persist_checklists()
    }

    pub fn rename_checklist(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
        title: &str,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        let checklist = self.run.checklists.get_mut(checklist_idx).ok_or_else(|| {
            EngineError::InvariantViolation(format!("no checklist at index {}", checklist_idx))
        })?;
        checklist.title = title.to_string();
        self.persist_checklists()
    }

    /// Remove a checklist and its items
    pub fn remove_checklist(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        if checklist_idx >= self.run.checklists.len() {
            return Err(EngineError::InvariantViolation(format!(
                "no checklist at index {}",
                checklist_idx
            )));
        }
        self.run.checklists.remove(checklist_idx);
        self.persist_checklists()
    }

    /// Append a copy of an existing checklist
    pub fn duplicate_checklist(
        &mut self,
        user_id: &str,
        checklist_idx: usize,
    ) -> Result<(), EngineError> {
        self.guard_modify(user_id)?;
        let copy = self
            .run
            .checklists
            .get(checklist_idx)
            .cloned()
            .ok_or_else(|| {
                EngineError::InvariantViolation(format!(
                    "no checklist at index {}",
                    checklist_idx
                ))
            })?;
        self.run.checklists.push(copy);
        self.persist_checklists()
    }

    fn persist_checklists(&mut self) -> Result<(), EngineError> {
        let version = self.tracker.begin();
        debug!(run = %self.run.id, version, "persisting checklists");
        if let Err(err) = self
            .store
            .save_checklists(&self.run.id, &self.run.checklists)
        {
            warn!(run = %self.run.id, version, %err, "checklist persistence failed");
            return Err(err.into());
        }
        Ok(())
    }
}
