use serde::{Deserialize, Serialize};

/// The value a comparison tests against: a string for text fields, a set
/// of option ids for select/multiselect fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Text(String),
    Options(Vec<String>),
}

/// A single field comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field_id: String,
    pub value: ConditionValue,
}

/// A boolean expression over property values.
///
/// Serialized in the externally-tagged wire shape of the host system:
/// `{"is": {...}}`, `{"isNot": {...}}`, `{"and": [...]}`, `{"or": [...]}`.
///
/// The authoring layer caps compound expressions at two comparisons, but
/// the expression tree and the evaluator are deliberately n-ary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionExpr {
    #[serde(rename = "is")]
    Is(Comparison),
    #[serde(rename = "isNot")]
    IsNot(Comparison),
    #[serde(rename = "and")]
    And(Vec<ConditionExpr>),
    #[serde(rename = "or")]
    Or(Vec<ConditionExpr>),
}

impl ConditionExpr {
    /// Whether this node is a bare comparison (is/isNot)
    pub fn is_comparison(&self) -> bool {
        matches!(self, ConditionExpr::Is(_) | ConditionExpr::IsNot(_))
    }

    /// Number of comparison leaves in this expression
    pub fn comparison_count(&self) -> usize {
        match self {
            ConditionExpr::Is(_) | ConditionExpr::IsNot(_) => 1,
            ConditionExpr::And(children) | ConditionExpr::Or(children) => {
                children.iter().map(ConditionExpr::comparison_count).sum()
            }
        }
    }
}

/// A named, reusable visibility rule scoped to one checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Opaque identifier
    pub id: String,
    pub condition_expr: ConditionExpr,
}

impl Condition {
    pub fn new(id: impl Into<String>, condition_expr: ConditionExpr) -> Self {
        Condition {
            id: id.into(),
            condition_expr,
        }
    }
}
