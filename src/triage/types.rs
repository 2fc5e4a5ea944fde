//! Shared types for the triage pipeline.

use serde::{Deserialize, Serialize};

use crate::error::TriageError;

// ── Event ───────────────────────────────────────────────────────────

/// Which webhook family delivered the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventName {
    /// `issues`
    Issue,
    /// `issue_comment`
    Comment,
    /// Anything else, kept verbatim so it can be reported.
    Other(String),
}

impl EventName {
    pub fn parse(name: &str) -> Self {
        match name {
            "issues" => Self::Issue,
            "issue_comment" => Self::Comment,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Issue => "issues",
            Self::Comment => "issue_comment",
            Self::Other(name) => name,
        }
    }
}

/// The comment a `issue_comment` event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRef {
    pub id: u64,
    /// The delivered payload carried no comment body.
    pub body_missing: bool,
}

/// One inbound delivery, threaded explicitly through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: EventName,
    pub action: String,
    /// Always present for `Issue` and `Comment`; `0` for `Other` events,
    /// which never reach a tracker.
    pub issue_number: u64,
    /// Name of the label just applied (`labeled` actions only).
    pub label: Option<String>,
    pub comment: Option<CommentRef>,
}

#[derive(Deserialize)]
struct Payload {
    action: Option<String>,
    issue: Option<IssuePayload>,
    label: Option<LabelPayload>,
    comment: Option<CommentPayload>,
}

#[derive(Deserialize)]
struct IssuePayload {
    number: u64,
}

#[derive(Deserialize)]
struct LabelPayload {
    name: String,
}

#[derive(Deserialize)]
struct CommentPayload {
    id: u64,
    body: Option<String>,
}

impl Event {
    /// Build an event from a webhook event name and its JSON payload.
    pub fn from_payload(event_name: &str, payload: &[u8]) -> Result<Self, TriageError> {
        let payload: Payload = serde_json::from_slice(payload)
            .map_err(|e| TriageError::InvalidPayload(e.to_string()))?;

        let action = payload
            .action
            .ok_or_else(|| TriageError::InvalidPayload("missing \"action\"".into()))?;

        let name = EventName::parse(event_name);

        // Only issue families need an issue; others are rejected by the classifier.
        let issue_number = match (&name, payload.issue) {
            (_, Some(issue)) => issue.number,
            (EventName::Other(_), None) => 0,
            (_, None) => {
                return Err(TriageError::InvalidPayload(
                    "missing \"issue.number\"".into(),
                ));
            }
        };

        let comment = payload.comment.map(|c| CommentRef {
            id: c.id,
            body_missing: c.body.is_none(),
        });
        if name == EventName::Comment && comment.is_none() {
            return Err(TriageError::InvalidPayload(
                "comment event without \"comment\"".into(),
            ));
        }

        Ok(Self {
            name,
            action,
            issue_number,
            label: payload.label.map(|l| l.name),
            comment,
        })
    }
}

// ── Intent ──────────────────────────────────────────────────────────

/// The workflow an event maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    IssueContentCheck,
    IssueLabelCheck,
    CommentContentCheck,
}

// ── Post snapshot ───────────────────────────────────────────────────

/// Text and author of an issue or comment, read fresh from the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostInfo {
    pub body: Option<String>,
    pub author_login: Option<String>,
}

impl PostInfo {
    pub fn new(body: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            author_login: Some(author.into()),
        }
    }

    /// The body, unless absent or empty.
    pub fn text(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }
}

/// A comment snapshot and the issue it was posted on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentInfo {
    /// `None` when the tracker did not say.
    pub issue_number: Option<u64>,
    pub post: PostInfo,
}

// ── Decision ────────────────────────────────────────────────────────

/// What a single invocation should do to the issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    NoOp,
    /// Post the responses for every unmet item and apply the label.
    AddLabelAndComment { responses: Vec<String> },
    RemoveLabel,
}

impl Decision {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoOp => "no_op",
            Self::AddLabelAndComment { .. } => "add_label_and_comment",
            Self::RemoveLabel => "remove_label",
        }
    }
}
