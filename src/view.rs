//! Ephemeral per-container presentation state.
//!
//! Collapse state is keyed by (scope, run id, checklist index) — by
//! position, not checklist identity. When a checklist is dragged the
//! affected indices are re-keyed so the state follows the moved
//! checklist; other structural edits leave the positional keys as they
//! are. This state lives beside the run, not inside it, and is never
//! persisted with it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::run::PlaybookRun;
use crate::ops::reorder::ChecklistMove;

/// Collapse/expand state for every checklist container the user has
/// touched, across scopes (e.g. the in-channel view vs. the overview).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollapseState {
    /// scope key -> checklist index -> collapsed
    #[serde(default)]
    state: IndexMap<String, IndexMap<usize, bool>>,
}

fn scope_key(scope: &str, run_id: &str) -> String {
    format!("{}:{}", scope, run_id)
}

impl CollapseState {
    pub fn new() -> Self {
        CollapseState::default()
    }

    /// Containers default to expanded
    pub fn is_collapsed(&self, scope: &str, run_id: &str, checklist_idx: usize) -> bool {
        self.state
            .get(&scope_key(scope, run_id))
            .and_then(|per_run| per_run.get(&checklist_idx))
            .copied()
            .unwrap_or(false)
    }

    pub fn set_collapsed(
        &mut self,
        scope: &str,
        run_id: &str,
        checklist_idx: usize,
        collapsed: bool,
    ) {
        self.state
            .entry(scope_key(scope, run_id))
            .or_default()
            .insert(checklist_idx, collapsed);
    }

    /// Collapse or expand every checklist of the run at once
    pub fn set_all(&mut self, scope: &str, run: &PlaybookRun, collapsed: bool) {
        let per_run = self.state.entry(scope_key(scope, &run.id)).or_default();
        for idx in 0..run.checklists.len() {
            per_run.insert(idx, collapsed);
        }
    }

    /// True iff every checklist of the run is collapsed
    pub fn all_collapsed(&self, scope: &str, run: &PlaybookRun) -> bool {
        (0..run.checklists.len()).all(|idx| self.is_collapsed(scope, &run.id, idx))
    }

    /// Re-key the positional entries after a checklist move so collapse
    /// state follows the moved checklist: every index between source and
    /// destination shifts by one toward the vacated slot, and the moved
    /// checklist's state lands on the destination index.
    pub fn shift_for_checklist_move(&mut self, scope: &str, run_id: &str, mv: ChecklistMove) {
        if mv.source_idx == mv.dest_idx {
            return;
        }
        let Some(per_run) = self.state.get_mut(&scope_key(scope, run_id)) else {
            return;
        };

        let old = per_run.clone();
        let lookup = |idx: usize| old.get(&idx).copied();

        let mut apply = |idx: usize, value: Option<bool>| match value {
            Some(v) => {
                per_run.insert(idx, v);
            }
            None => {
                per_run.shift_remove(&idx);
            }
        };

        if mv.source_idx < mv.dest_idx {
            for i in mv.source_idx..mv.dest_idx {
                apply(i, lookup(i + 1));
            }
        } else {
            for i in (mv.dest_idx + 1)..=mv.source_idx {
                apply(i, lookup(i - 1));
            }
        }
        apply(mv.dest_idx, lookup(mv.source_idx));
    }
}
