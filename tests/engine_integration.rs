//! End-to-end scenarios over the engine: state machine, conditions,
//! reordering, and filtering working against one run structure.

use pretty_assertions::assert_eq;

use runbook::model::{
    Checklist, ChecklistItem, ChecklistItemState, Comparison, Condition, ConditionAction,
    ConditionExpr, ConditionValue, PlaybookRun, PropertyField, PropertyState, PropertyValue,
};
use runbook::ops::{
    self, ChecklistMove, FilterOption, ItemMove, ItemsFilter,
};

const NOW: i64 = 1_700_000_000_000;

fn item(id: &str, title: &str) -> ChecklistItem {
    ChecklistItem::new(id, title)
}

fn sample_run() -> PlaybookRun {
    let mut run = PlaybookRun::new("run1", "Incident response");
    let mut triage = Checklist::new("Triage");
    triage.items.push(item("a", "Acknowledge the page"));
    triage.items.push(item("b", "Identify blast radius"));
    triage.items.push(item("c", "Open a war room"));
    let mut mitigate = Checklist::new("Mitigate");
    mitigate.items.push(item("d", "Roll back the deploy"));
    run.checklists.push(triage);
    run.checklists.push(mitigate);
    run
}

#[test]
fn checklist_reorder_scenario() {
    // ["A","B","C"]: moving index 0 to index 2 yields ["B","C","A"]
    let run = sample_run();
    let next = ops::move_item(
        &run.checklists,
        ItemMove {
            source_checklist: 0,
            source_idx: 0,
            dest_checklist: 0,
            dest_idx: 2,
        },
    )
    .unwrap();
    assert_eq!(next[0].item_ids(), vec!["b", "c", "a"]);
}

#[test]
fn advance_walks_the_lifecycle() {
    let mut it = item("t", "Investigate");
    ops::advance(&mut it, NOW, "").unwrap();
    assert_eq!(it.state, ChecklistItemState::InProgress);
    ops::advance(&mut it, NOW, "").unwrap();
    assert_eq!(it.state, ChecklistItemState::Closed);
}

#[test]
fn command_run_skips_in_progress() {
    let mut it = item("t", "Restart service");
    it.command = "/restart".into();
    ops::run_command(&mut it, NOW, "").unwrap();
    assert_eq!(it.state, ChecklistItemState::Closed);
    assert_eq!(it.command_last_run, NOW);
}

#[test]
fn hidden_item_beats_every_filter() {
    // condition {is: priority high} against {priority: low} hides the item
    let mut run = sample_run();
    run.checklists[0].items[0].condition_id = "cond1".into();

    let conditions = vec![Condition::new(
        "cond1",
        ConditionExpr::Is(Comparison {
            field_id: "priority".into(),
            value: ConditionValue::Text("high".into()),
        }),
    )];
    let mut props = PropertyState::new(vec![PropertyField::text("priority", "Priority")]);
    props.set_value("priority", PropertyValue::Text("low".into()));

    ops::resolve_visibility(&mut run.checklists[0], &conditions, &props);
    let governed = &run.checklists[0].items[0];
    assert_eq!(governed.condition_action, ConditionAction::Hidden);

    let mut filter = ItemsFilter::default();
    assert!(!ops::should_show(governed, &filter, "me", NOW));
    filter.all = true;
    assert!(!ops::should_show(governed, &filter, "me", NOW));
}

#[test]
fn last_assignee_toggle_cannot_be_cleared() {
    // {all:false, checked:false, skipped:true, me:true, unassigned:false,
    //  others:false}: unchecking `me` is rejected and nothing changes
    let mut filter = ItemsFilter {
        all: false,
        checked: false,
        skipped: true,
        me: true,
        unassigned: false,
        others: false,
        overdue_only: false,
    };
    let before = filter;
    assert!(ops::set_option(&mut filter, FilterOption::Me, false).is_err());
    assert_eq!(filter, before);
}

#[test]
fn cross_checklist_move_clears_condition_reference() {
    let mut run = sample_run();
    run.checklists[0].items[0].condition_id = "cond1".into();
    run.checklists[0].items[0].condition_action = ConditionAction::Shown;

    let next = ops::move_item(
        &run.checklists,
        ItemMove {
            source_checklist: 0,
            source_idx: 0,
            dest_checklist: 1,
            dest_idx: 0,
        },
    )
    .unwrap();

    let moved = &next[1].items[0];
    assert_eq!(moved.id, "a");
    assert_eq!(moved.condition_id, "");
    assert_eq!(moved.condition_action, ConditionAction::None);
}

#[test]
fn reorders_compose_without_losing_items() {
    let run = sample_run();
    let step1 = ops::move_checklist(
        &run.checklists,
        ChecklistMove { source_idx: 0, dest_idx: 1 },
    )
    .unwrap();
    let step2 = ops::move_item(
        &step1,
        ItemMove {
            source_checklist: 1,
            source_idx: 2,
            dest_checklist: 0,
            dest_idx: 1,
        },
    )
    .unwrap();

    let mut all_ids: Vec<&str> = step2.iter().flat_map(|cl| cl.item_ids()).collect();
    all_ids.sort_unstable();
    assert_eq!(all_ids, vec!["a", "b", "c", "d"]);
}

#[test]
fn overdue_count_feeds_filter_reset() {
    let mut run = sample_run();
    run.checklists[0].items[1].due_date = NOW - 60_000;

    assert_eq!(run.overdue_count(NOW), 1);

    let mut filter = ItemsFilter::default();
    filter.overdue_only = true;
    ops::auto_reset_overdue(&mut filter, &run.checklists, NOW);
    assert!(filter.overdue_only);

    ops::skip(&mut run.checklists[0].items[1], NOW, "").unwrap();
    assert_eq!(run.overdue_count(NOW), 0);
    ops::auto_reset_overdue(&mut filter, &run.checklists, NOW);
    assert!(!filter.overdue_only);
}

#[test]
fn run_structure_serde_round_trip() {
    let mut run = sample_run();
    run.checklists[0].items[0].condition_id = "cond1".into();
    run.checklists[0].items[0].due_date = NOW;

    let json = serde_json::to_string(&run).unwrap();
    let loaded: PlaybookRun = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, run);
}
