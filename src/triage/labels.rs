//! Label membership of an issue relative to the configured labels.

use crate::config::TriageConfig;

/// Derived from one snapshot of the issue's labels; never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelState {
    /// The issue carries at least one label that triggers checking.
    pub has_check_label: bool,
    /// The issue already carries the "needs info" label.
    pub has_add_label: bool,
}

impl LabelState {
    pub fn from_labels(current: &[String], config: &TriageConfig) -> Self {
        Self {
            has_check_label: has_label_to_check(current, &config.labels_to_check),
            has_add_label: has_label_to_add(current, &config.label_to_add),
        }
    }

    /// The issue should be evaluated and is not already flagged.
    pub fn awaiting_review(&self) -> bool {
        self.has_check_label && !self.has_add_label
    }
}

/// True iff the two label sets intersect.
pub fn has_label_to_check(current: &[String], labels_to_check: &[String]) -> bool {
    current.iter().any(|label| labels_to_check.contains(label))
}

/// Exact membership of the label-to-add.
pub fn has_label_to_add(current: &[String], label_to_add: &str) -> bool {
    current.iter().any(|label| label == label_to_add)
}
