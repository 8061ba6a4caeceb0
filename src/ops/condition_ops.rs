use tracing::debug;

use crate::model::checklist::Checklist;
use crate::model::condition::{Comparison, Condition, ConditionExpr, ConditionValue};
use crate::model::item::ConditionAction;
use crate::model::property::{PropertyField, PropertyState, PropertyType, PropertyValue};
use crate::ops::EngineError;

/// Authoring cap on comparisons per condition. A UI affordance, not a
/// structural limit: the expression tree and [`evaluate`] are n-ary.
pub const MAX_COMPARISONS: usize = 2;

/// Compound expressions may not nest further compounds.
const MAX_DEPTH: usize = 1;

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate an expression against the current property record.
/// Referentially transparent: no inputs are mutated.
pub fn evaluate(expr: &ConditionExpr, props: &PropertyState) -> bool {
    match expr {
        ConditionExpr::Is(cmp) => comparison_holds(cmp, props),
        ConditionExpr::IsNot(cmp) => !comparison_holds(cmp, props),
        ConditionExpr::And(children) => children.iter().all(|c| evaluate(c, props)),
        ConditionExpr::Or(children) => children.iter().any(|c| evaluate(c, props)),
    }
}

/// `is` semantics per field type. A missing field or unset value never
/// holds, so `is` is false and `isNot` is true for it.
///
/// Text: case-insensitive equality. Select: the field's value is a member
/// of the condition set. Multiselect: the field's value set intersects
/// the condition set.
fn comparison_holds(cmp: &Comparison, props: &PropertyState) -> bool {
    let Some(field) = props.field(&cmp.field_id) else {
        return false;
    };
    let Some(value) = props.value(&cmp.field_id) else {
        return false;
    };

    match field.field_type {
        PropertyType::Text => {
            let (ConditionValue::Text(want), PropertyValue::Text(have)) = (&cmp.value, value)
            else {
                return false;
            };
            want.to_lowercase() == have.to_lowercase()
        }
        PropertyType::Select => {
            let (ConditionValue::Options(want), PropertyValue::Text(have)) = (&cmp.value, value)
            else {
                return false;
            };
            want.iter().any(|w| w == have)
        }
        PropertyType::Multiselect => {
            let (ConditionValue::Options(want), PropertyValue::Options(have)) =
                (&cmp.value, value)
            else {
                return false;
            };
            want.iter().any(|w| have.contains(w))
        }
    }
}

/// Recompute the `condition_action` of every item in the checklist.
///
/// Items governed by a condition resolve to Shown/Hidden from the current
/// property record; an unknown `condition_id` resolves to Shown
/// (fail-open), and unconditional items are reset to no annotation.
pub fn resolve_visibility(
    checklist: &mut Checklist,
    conditions: &[Condition],
    props: &PropertyState,
) {
    for item in &mut checklist.items {
        if item.condition_id.is_empty() {
            item.condition_action = ConditionAction::None;
            continue;
        }
        let action = match conditions.iter().find(|c| c.id == item.condition_id) {
            Some(condition) if !evaluate(&condition.condition_expr, props) => {
                ConditionAction::Hidden
            }
            _ => ConditionAction::Shown,
        };
        if item.condition_action != action {
            debug!(item = %item.id, condition = %item.condition_id, ?action,
                "condition resolved");
        }
        item.condition_action = action;
    }
}

// ---------------------------------------------------------------------------
// Authoring
// ---------------------------------------------------------------------------

/// Logical connective of a compound expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Add a sibling comparison. A bare comparison is wrapped into an `and`
/// when the second arrives; further additions are rejected past
/// [`MAX_COMPARISONS`].
pub fn add_comparison(
    condition: &mut Condition,
    comparison: ConditionExpr,
) -> Result<(), EngineError> {
    if !comparison.is_comparison() {
        return Err(EngineError::InvariantViolation(
            "only is/isNot comparisons can be added to a condition".into(),
        ));
    }
    if condition.condition_expr.comparison_count() >= MAX_COMPARISONS {
        return Err(EngineError::InvariantViolation(format!(
            "condition {} already has {} comparisons",
            condition.id, MAX_COMPARISONS
        )));
    }

    match &mut condition.condition_expr {
        expr @ (ConditionExpr::Is(_) | ConditionExpr::IsNot(_)) => {
            let first = expr.clone();
            *expr = ConditionExpr::And(vec![first, comparison]);
        }
        ConditionExpr::And(children) | ConditionExpr::Or(children) => {
            children.push(comparison);
        }
    }
    Ok(())
}

/// Remove the comparison at `idx`. At least one comparison must remain,
/// so removing the last one is a no-op; removing down to one unwraps the
/// compound back to a bare comparison.
pub fn remove_comparison(condition: &mut Condition, idx: usize) -> Result<(), EngineError> {
    match &mut condition.condition_expr {
        ConditionExpr::Is(_) | ConditionExpr::IsNot(_) => Ok(()), // minimum of one
        ConditionExpr::And(children) | ConditionExpr::Or(children) => {
            if idx >= children.len() {
                return Err(EngineError::InvariantViolation(format!(
                    "comparison index {} out of bounds",
                    idx
                )));
            }
            if children.len() == 1 {
                return Ok(()); // minimum of one
            }
            children.remove(idx);
            if children.len() == 1 {
                let remaining = children.remove(0);
                condition.condition_expr = remaining;
            }
            Ok(())
        }
    }
}

/// Switch the connective of a compound expression. A bare comparison has
/// no connective, so this is a no-op until a second comparison exists.
pub fn set_logical_operator(condition: &mut Condition, op: LogicalOperator) {
    let needs_flip = matches!(
        (&condition.condition_expr, op),
        (ConditionExpr::And(_), LogicalOperator::Or)
            | (ConditionExpr::Or(_), LogicalOperator::And)
    );
    if !needs_flip {
        return;
    }
    let placeholder = ConditionExpr::And(Vec::new());
    let children = match std::mem::replace(&mut condition.condition_expr, placeholder) {
        ConditionExpr::And(children) | ConditionExpr::Or(children) => children,
        leaf => {
            condition.condition_expr = leaf;
            return;
        }
    };
    condition.condition_expr = match op {
        LogicalOperator::And => ConditionExpr::And(children),
        LogicalOperator::Or => ConditionExpr::Or(children),
    };
}

/// Point the comparison at `idx` to a different field, resetting its value
/// to the default for the new field's type: empty string for text fields,
/// the first available option for select/multiselect fields.
pub fn change_comparison_field(
    condition: &mut Condition,
    idx: usize,
    field: &PropertyField,
) -> Result<(), EngineError> {
    let cmp = comparison_at_mut(&mut condition.condition_expr, idx).ok_or_else(|| {
        EngineError::InvariantViolation(format!("comparison index {} out of bounds", idx))
    })?;

    cmp.field_id = field.id.clone();
    cmp.value = match field.field_type {
        PropertyType::Text => ConditionValue::Text(String::new()),
        PropertyType::Select | PropertyType::Multiselect => ConditionValue::Options(
            field.first_option_id().map(String::from).into_iter().collect(),
        ),
    };
    Ok(())
}

fn comparison_at_mut(expr: &mut ConditionExpr, idx: usize) -> Option<&mut Comparison> {
    match expr {
        ConditionExpr::Is(cmp) | ConditionExpr::IsNot(cmp) => (idx == 0).then_some(cmp),
        ConditionExpr::And(children) | ConditionExpr::Or(children) => {
            match children.get_mut(idx)? {
                ConditionExpr::Is(cmp) | ConditionExpr::IsNot(cmp) => Some(cmp),
                _ => None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Structural validation: bounded nesting, non-empty compounds, and value
/// shapes that match the referenced field's type. A comparison against an
/// unknown field passes (fields may not have synced yet).
pub fn validate_condition(
    condition: &Condition,
    fields: &[PropertyField],
) -> Result<(), EngineError> {
    validate_expr(&condition.condition_expr, 0, fields)
}

fn validate_expr(
    expr: &ConditionExpr,
    depth: usize,
    fields: &[PropertyField],
) -> Result<(), EngineError> {
    match expr {
        ConditionExpr::And(children) | ConditionExpr::Or(children) => {
            if children.is_empty() {
                return Err(EngineError::InvariantViolation(
                    "compound condition must have at least one nested condition".into(),
                ));
            }
            if depth >= MAX_DEPTH {
                return Err(EngineError::InvariantViolation(format!(
                    "condition nesting depth exceeds maximum allowed ({})",
                    MAX_DEPTH
                )));
            }
            for child in children {
                validate_expr(child, depth + 1, fields)?;
            }
            Ok(())
        }
        ConditionExpr::Is(cmp) | ConditionExpr::IsNot(cmp) => validate_comparison(cmp, fields),
    }
}

fn validate_comparison(cmp: &Comparison, fields: &[PropertyField]) -> Result<(), EngineError> {
    if cmp.field_id.is_empty() {
        return Err(EngineError::InvariantViolation(
            "field_id cannot be empty".into(),
        ));
    }
    let Some(field) = fields.iter().find(|f| f.id == cmp.field_id) else {
        return Ok(());
    };

    match field.field_type {
        PropertyType::Text => match &cmp.value {
            ConditionValue::Text(_) => Ok(()),
            ConditionValue::Options(_) => Err(EngineError::InvariantViolation(
                "text field condition value must be a string".into(),
            )),
        },
        PropertyType::Select | PropertyType::Multiselect => {
            let ConditionValue::Options(wanted) = &cmp.value else {
                return Err(EngineError::InvariantViolation(
                    "select field condition value must be an array".into(),
                ));
            };
            if wanted.is_empty() {
                return Err(EngineError::InvariantViolation(
                    "select field condition value array cannot be empty".into(),
                ));
            }
            for option_id in wanted {
                if !field.options.iter().any(|o| &o.id == option_id) {
                    return Err(EngineError::InvariantViolation(format!(
                        "condition value {} does not match any option of field {}",
                        option_id, field.id
                    )));
                }
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
