use serde::{Deserialize, Serialize};

use super::item::{ChecklistItem, ChecklistItemState};

/// An ordered group of checklist items. Item order is both display order
/// and execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub title: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    pub fn new(title: impl Into<String>) -> Self {
        Checklist {
            title: title.into(),
            items: Vec::new(),
        }
    }

    /// (completed, total) for progress display. Hidden items are excluded
    /// from both counts; skipped items are excluded from the total.
    pub fn completed_counts(&self) -> (usize, usize) {
        let mut completed = 0;
        let mut total = 0;
        for item in &self.items {
            if item.is_hidden() {
                continue;
            }
            if item.state != ChecklistItemState::Skip {
                total += 1;
            }
            if item.state == ChecklistItemState::Closed {
                completed += 1;
            }
        }
        (completed, total)
    }

    /// Item identifiers in order
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.id.as_str()).collect()
    }
}
