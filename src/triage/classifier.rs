//! Maps an inbound event onto the workflow that handles it.
//!
//! Exactly four combinations are accepted:
//! - `issues` / `opened` or `edited` → issue content check
//! - `issues` / `labeled` with a label in the payload → issue label check
//! - `issue_comment` / `created` or `edited` → comment content check
//!
//! Everything else is rejected.

use crate::error::TriageError;
use crate::triage::types::{Event, EventName, Intent};

/// Classify a raw (event name, action, label presence) tuple.
pub fn classify(
    event_name: &EventName,
    action: &str,
    has_label_payload: bool,
) -> Result<Intent, TriageError> {
    match (event_name, action) {
        (EventName::Issue, "opened" | "edited") => Ok(Intent::IssueContentCheck),
        (EventName::Issue, "labeled") if has_label_payload => Ok(Intent::IssueLabelCheck),
        (EventName::Comment, "created" | "edited") => Ok(Intent::CommentContentCheck),
        _ => Err(TriageError::UnsupportedEvent {
            event_name: event_name.as_str().to_string(),
            action: action.to_string(),
        }),
    }
}

/// Classify an already-parsed event.
pub fn classify_event(event: &Event) -> Result<Intent, TriageError> {
    classify(&event.name, &event.action, event.label.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn other(name: &str) -> EventName {
        EventName::Other(name.into())
    }

    #[test]
    fn issue_opened_and_edited_check_content() {
        for action in ["opened", "edited"] {
            assert_eq!(
                classify(&EventName::Issue, action, false).unwrap(),
                Intent::IssueContentCheck
            );
        }
    }

    #[test]
    fn issue_labeled_checks_label() {
        assert_eq!(
            classify(&EventName::Issue, "labeled", true).unwrap(),
            Intent::IssueLabelCheck
        );
    }

    #[test]
    fn labeled_without_label_payload_is_rejected() {
        assert!(matches!(
            classify(&EventName::Issue, "labeled", false),
            Err(TriageError::UnsupportedEvent { .. })
        ));
    }

    #[test]
    fn comment_created_and_edited_check_comment() {
        for action in ["created", "edited"] {
            assert_eq!(
                classify(&EventName::Comment, action, false).unwrap(),
                Intent::CommentContentCheck
            );
        }
    }

    #[test]
    fn rejects_other_actions() {
        for (name, action) in [
            (EventName::Issue, "closed"),
            (EventName::Issue, "unlabeled"),
            (EventName::Issue, "deleted"),
            (EventName::Comment, "deleted"),
            (EventName::Comment, "opened"),
        ] {
            assert!(
                matches!(
                    classify(&name, action, true),
                    Err(TriageError::UnsupportedEvent { .. })
                ),
                "{name:?}/{action}"
            );
        }
    }

    #[test]
    fn pull_request_opened_is_unsupported() {
        let err = classify(&other("pull_request"), "opened", false).unwrap_err();
        match err {
            TriageError::UnsupportedEvent { event_name, action } => {
                assert_eq!(event_name, "pull_request");
                assert_eq!(action, "opened");
            }
            other => panic!("Expected UnsupportedEvent, got {:?}", other),
        }
    }

    #[test]
    fn classify_event_uses_label_presence() {
        let mut event = Event {
            name: EventName::Issue,
            action: "labeled".into(),
            issue_number: 1,
            label: None,
            comment: None,
        };
        assert!(classify_event(&event).is_err());
        event.label = Some("bug".into());
        assert_eq!(classify_event(&event).unwrap(), Intent::IssueLabelCheck);
    }
}
