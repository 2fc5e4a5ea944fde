//! Requirement evaluation.
//!
//! Checks a post against the configured required items and returns the
//! response of every item the post does not satisfy, in configured order.
//! Matching is case-insensitive containment of each keyword inside the post.
//! An empty post satisfies nothing.

use tracing::debug;

use crate::config::RequiredItem;

impl RequiredItem {
    /// Whether the (already lowercased) post satisfies this item.
    fn is_satisfied_by(&self, post_lower: &str) -> bool {
        let mut keywords = self
            .content
            .iter()
            .map(|c| post_lower.contains(&c.to_lowercase()));
        if self.require_all {
            keywords.all(|found| found)
        } else {
            keywords.any(|found| found)
        }
    }
}

/// Responses for every item `post` leaves unmet.
pub fn evaluate(items: &[RequiredItem], post: &str) -> Vec<String> {
    let post_lower = post.to_lowercase();

    let unmet: Vec<String> = items
        .iter()
        .filter(|item| !item.is_satisfied_by(&post_lower))
        .map(|item| item.response.clone())
        .collect();

    debug!(
        items = items.len(),
        unmet = unmet.len(),
        "Evaluated post against required items"
    );
    unmet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content: &[&str], response: &str, require_all: bool) -> RequiredItem {
        RequiredItem {
            content: content.iter().map(|c| c.to_string()).collect(),
            response: response.into(),
            require_all,
        }
    }

    #[test]
    fn require_all_unmet_when_any_keyword_missing() {
        let items = vec![item(&["os", "version"], "Add OS and version", true)];
        assert_eq!(evaluate(&items, "My OS is Linux"), vec!["Add OS and version"]);
        assert!(evaluate(&items, "OS: linux, Version: 1.2").is_empty());
    }

    #[test]
    fn require_one_unmet_only_when_all_keywords_missing() {
        let items = vec![item(&["log", "trace"], "Attach a log", false)];
        assert!(evaluate(&items, "stack TRACE below").is_empty());
        assert_eq!(evaluate(&items, "it broke"), vec!["Attach a log"]);
    }

    #[test]
    fn matching_ignores_case_both_ways() {
        let items = vec![item(&["Steps To Reproduce"], "Please add repro steps", true)];
        assert!(evaluate(&items, "steps to reproduce: click").is_empty());
        assert!(evaluate(&items, "STEPS TO REPRODUCE").is_empty());
    }

    #[test]
    fn keyword_must_be_inside_post_not_the_reverse() {
        // "steps" is contained in the keyword but the keyword is not in the post.
        let items = vec![item(&["steps to reproduce"], "Please add repro steps", true)];
        assert_eq!(evaluate(&items, "steps"), vec!["Please add repro steps"]);
    }

    #[test]
    fn empty_post_fails_every_item() {
        let items = vec![
            item(&["a"], "first", true),
            item(&["b", "c"], "second", false),
        ];
        assert_eq!(evaluate(&items, ""), vec!["first", "second"]);
    }

    #[test]
    fn preserves_configured_order() {
        let items = vec![
            item(&["alpha"], "1", true),
            item(&["beta"], "2", true),
            item(&["gamma"], "3", true),
        ];
        assert_eq!(evaluate(&items, "beta only"), vec!["1", "3"]);
    }

    #[test]
    fn no_items_means_nothing_unmet() {
        assert!(evaluate(&[], "").is_empty());
        assert!(evaluate(&[], "anything").is_empty());
    }

    #[test]
    fn crash_report_without_repro_steps() {
        let items = vec![item(&["steps to reproduce"], "Please add repro steps", true)];
        assert_eq!(evaluate(&items, "it crashes"), vec!["Please add repro steps"]);
    }
}
