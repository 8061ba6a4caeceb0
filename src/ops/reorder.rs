use tracing::debug;

use crate::model::checklist::Checklist;
use crate::model::item::ConditionAction;
use crate::ops::EngineError;

// ---------------------------------------------------------------------------
// Move descriptors
// ---------------------------------------------------------------------------

/// Reorder a checklist within the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistMove {
    pub source_idx: usize,
    pub dest_idx: usize,
}

/// Move an item within one checklist or across two. Indices are the
/// begin/end coordinates of the drag; intermediate positions are not part
/// of the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemMove {
    pub source_checklist: usize,
    pub source_idx: usize,
    pub dest_checklist: usize,
    /// Insert position in the destination after the source removal;
    /// `items.len()` appends, 0 works for an empty destination.
    pub dest_idx: usize,
}

// ---------------------------------------------------------------------------
// Checklist-level reorder
// ---------------------------------------------------------------------------

/// Move a checklist from `source_idx` to `dest_idx`, returning the new
/// checklist sequence. Pure: the input is never mutated, so concurrent
/// reads of the previous structure stay valid until the result is
/// committed.
pub fn move_checklist(
    checklists: &[Checklist],
    mv: ChecklistMove,
) -> Result<Vec<Checklist>, EngineError> {
    if mv.source_idx >= checklists.len() || mv.dest_idx >= checklists.len() {
        return Err(EngineError::InvariantViolation(format!(
            "checklist move out of bounds: {} -> {} with {} checklists",
            mv.source_idx,
            mv.dest_idx,
            checklists.len()
        )));
    }

    let mut next = checklists.to_vec();
    if mv.source_idx == mv.dest_idx {
        return Ok(next);
    }

    let moved = next.remove(mv.source_idx);
    next.insert(mv.dest_idx, moved);
    debug!(from = mv.source_idx, to = mv.dest_idx, "checklist moved");
    Ok(next)
}

// ---------------------------------------------------------------------------
// Item-level reorder
// ---------------------------------------------------------------------------

/// Move an item per the descriptor, returning the new checklist sequence.
///
/// Moving across checklists clears the item's condition reference:
/// conditions are scoped to one checklist, and carrying a stale id into
/// the destination would break that invariant. Draining a checklist
/// leaves it empty rather than deleting it.
pub fn move_item(checklists: &[Checklist], mv: ItemMove) -> Result<Vec<Checklist>, EngineError> {
    let src_list = checklists.get(mv.source_checklist).ok_or_else(|| {
        EngineError::InvariantViolation(format!(
            "source checklist {} out of bounds",
            mv.source_checklist
        ))
    })?;
    let dst_list = checklists.get(mv.dest_checklist).ok_or_else(|| {
        EngineError::InvariantViolation(format!(
            "destination checklist {} out of bounds",
            mv.dest_checklist
        ))
    })?;

    if mv.source_idx >= src_list.items.len() {
        return Err(EngineError::InvariantViolation(format!(
            "source item {} out of bounds in checklist {}",
            mv.source_idx, mv.source_checklist
        )));
    }

    // Destination is an insert position in the post-removal sequence.
    let dest_len = if mv.source_checklist == mv.dest_checklist {
        src_list.items.len() - 1
    } else {
        dst_list.items.len()
    };
    if mv.dest_idx > dest_len {
        return Err(EngineError::InvariantViolation(format!(
            "destination index {} out of bounds in checklist {}",
            mv.dest_idx, mv.dest_checklist
        )));
    }

    let mut next = checklists.to_vec();

    if mv.source_checklist == mv.dest_checklist {
        if mv.source_idx == mv.dest_idx {
            return Ok(next);
        }
        let items = &mut next[mv.source_checklist].items;
        let moved = items.remove(mv.source_idx);
        items.insert(mv.dest_idx, moved);
    } else {
        let mut moved = next[mv.source_checklist].items.remove(mv.source_idx);
        if !moved.condition_id.is_empty() {
            debug!(item = %moved.id, condition = %moved.condition_id,
                "clearing condition on cross-checklist move");
            moved.condition_id.clear();
            moved.condition_action = ConditionAction::None;
        }
        next[mv.dest_checklist].items.insert(mv.dest_idx, moved);
    }

    Ok(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::ChecklistItem;

    fn checklist(title: &str, item_ids: &[&str]) -> Checklist {
        let mut cl = Checklist::new(title);
        for id in item_ids {
            cl.items.push(ChecklistItem::new(*id, format!("task {}", id)));
        }
        cl
    }

    fn sample() -> Vec<Checklist> {
        vec![
            checklist("First", &["a", "b", "c"]),
            checklist("Second", &["d", "e"]),
            checklist("Empty", &[]),
        ]
    }

    // --- Checklist moves ---

    #[test]
    fn test_move_checklist_forward() {
        let lists = sample();
        let next = move_checklist(&lists, ChecklistMove { source_idx: 0, dest_idx: 2 }).unwrap();
        let titles: Vec<&str> = next.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "Empty", "First"]);
        // input untouched
        assert_eq!(lists[0].title, "First");
    }

    #[test]
    fn test_move_checklist_noop() {
        let lists = sample();
        let next = move_checklist(&lists, ChecklistMove { source_idx: 1, dest_idx: 1 }).unwrap();
        assert_eq!(next, lists);
    }

    #[test]
    fn test_move_checklist_out_of_bounds() {
        let lists = sample();
        let err =
            move_checklist(&lists, ChecklistMove { source_idx: 3, dest_idx: 0 }).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));
    }

    // --- Item moves within a checklist ---

    #[test]
    fn test_move_item_within_checklist() {
        // ["a","b","c"]: 0 -> 2 yields ["b","c","a"]
        let lists = sample();
        let next = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 0,
                dest_checklist: 0,
                dest_idx: 2,
            },
        )
        .unwrap();
        assert_eq!(next[0].item_ids(), vec!["b", "c", "a"]);
        assert_eq!(lists[0].item_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_item_same_position_noop() {
        let lists = sample();
        let next = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 1,
                dest_checklist: 0,
                dest_idx: 1,
            },
        )
        .unwrap();
        assert_eq!(next, lists);
    }

    // --- Item moves across checklists ---

    #[test]
    fn test_move_item_across_checklists() {
        let lists = sample();
        let next = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 1,
                dest_checklist: 1,
                dest_idx: 0,
            },
        )
        .unwrap();
        assert_eq!(next[0].item_ids(), vec!["a", "c"]);
        assert_eq!(next[1].item_ids(), vec!["b", "d", "e"]);
    }

    #[test]
    fn test_move_into_empty_checklist() {
        let lists = sample();
        let next = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 0,
                dest_checklist: 2,
                dest_idx: 0,
            },
        )
        .unwrap();
        assert_eq!(next[2].item_ids(), vec!["a"]);
    }

    #[test]
    fn test_move_only_item_leaves_empty_checklist() {
        let lists = vec![checklist("One", &["a"]), checklist("Two", &[])];
        let next = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 0,
                dest_checklist: 1,
                dest_idx: 0,
            },
        )
        .unwrap();
        assert!(next[0].items.is_empty());
        assert_eq!(next.len(), 2); // source checklist not deleted
    }

    #[test]
    fn test_cross_checklist_move_clears_condition() {
        let mut lists = sample();
        lists[0].items[0].condition_id = "cond1".into();
        lists[0].items[0].condition_action = ConditionAction::Shown;

        let next = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 0,
                dest_checklist: 1,
                dest_idx: 2,
            },
        )
        .unwrap();
        let moved = &next[1].items[2];
        assert_eq!(moved.id, "a");
        assert_eq!(moved.condition_id, "");
        assert_eq!(moved.condition_action, ConditionAction::None);
    }

    #[test]
    fn test_within_checklist_move_keeps_condition() {
        let mut lists = sample();
        lists[0].items[0].condition_id = "cond1".into();

        let next = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 0,
                dest_checklist: 0,
                dest_idx: 1,
            },
        )
        .unwrap();
        let moved = next[0].items.iter().find(|i| i.id == "a").unwrap();
        assert_eq!(moved.condition_id, "cond1");
    }

    #[test]
    fn test_move_item_dest_out_of_bounds() {
        let lists = sample();
        // same-checklist: post-removal len is 2, so dest 3 is invalid
        let err = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 0,
                dest_checklist: 0,
                dest_idx: 3,
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));

        // cross-checklist: appending at len is valid
        let next = move_item(
            &lists,
            ItemMove {
                source_checklist: 0,
                source_idx: 0,
                dest_checklist: 1,
                dest_idx: 2,
            },
        )
        .unwrap();
        assert_eq!(next[1].item_ids(), vec!["d", "e", "a"]);
    }
}
