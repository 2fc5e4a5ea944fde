//! Workflow decision engine.
//!
//! Turns an intent into a [`Decision`] by reading the issue's current state
//! from the tracker. The engine only reads; every mutation is left to the
//! executor. The branch logic itself lives in the pure `decide_*` functions
//! so it can be exercised without a tracker.
//!
//! Idempotency comes from always re-reading labels: an issue that already
//! carries the label-to-add is never commented on again, no matter how often
//! the triggering event is redelivered.

use tracing::{debug, info};

use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use crate::tracker::IssueTracker;
use crate::triage::labels::LabelState;
use crate::triage::rules::evaluate;
use crate::triage::types::{Decision, Event, Intent, PostInfo};

/// Decision for an issue that is awaiting review, given its fresh snapshot.
pub fn decide_issue(config: &TriageConfig, issue: &PostInfo) -> Decision {
    if let Some(author) = issue.author_login.as_deref() {
        if config.is_exempt(author) {
            info!(author, "Issue author is exempt, skipping");
            return Decision::NoOp;
        }
    }

    let Some(body) = issue.text() else {
        info!("Issue body is empty, nothing to check");
        return Decision::NoOp;
    };

    let responses = evaluate(&config.required_items, body);
    if responses.is_empty() {
        info!("Issue already satisfies every required item");
        return Decision::NoOp;
    }
    Decision::AddLabelAndComment { responses }
}

/// Decision for a comment on an issue that carries the label-to-add.
///
/// Only the original poster can resolve the request, and any newly satisfied
/// item is enough to remove the label.
pub fn decide_comment(
    config: &TriageConfig,
    comment: &PostInfo,
    original_poster: Option<&str>,
) -> Decision {
    let by_original_poster = match (comment.author_login.as_deref(), original_poster) {
        (Some(author), Some(poster)) => author == poster,
        _ => false,
    };
    if !by_original_poster {
        info!(
            author = comment.author_login.as_deref().unwrap_or("<unknown>"),
            "Comment is not from the original poster, ignoring"
        );
        return Decision::NoOp;
    }

    let Some(body) = comment.body.as_deref() else {
        info!("Comment has no body, nothing to check");
        return Decision::NoOp;
    };

    let responses = evaluate(&config.required_items, body);
    if responses.len() < config.required_items.len() {
        Decision::RemoveLabel
    } else {
        debug!("Comment satisfies no required item");
        Decision::NoOp
    }
}

/// Reads tracker state and decides what one invocation should do.
pub struct DecisionEngine<'a> {
    config: &'a TriageConfig,
    tracker: &'a dyn IssueTracker,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(config: &'a TriageConfig, tracker: &'a dyn IssueTracker) -> Self {
        Self { config, tracker }
    }

    pub async fn decide(&self, event: &Event, intent: Intent) -> Result<Decision> {
        match intent {
            Intent::IssueContentCheck | Intent::IssueLabelCheck => {
                self.check_issue(event.issue_number).await
            }
            Intent::CommentContentCheck => self.check_comment(event).await,
        }
    }

    async fn label_state(&self, issue_number: u64) -> Result<LabelState> {
        let labels = self
            .tracker
            .list_labels(issue_number)
            .await
            .map_err(TriageError::fetch("issue labels"))?;
        Ok(LabelState::from_labels(&labels, self.config))
    }

    async fn check_issue(&self, issue_number: u64) -> Result<Decision> {
        let state = self.label_state(issue_number).await?;
        if !state.awaiting_review() {
            debug!(
                issue = issue_number,
                has_check_label = state.has_check_label,
                has_add_label = state.has_add_label,
                "Issue is not awaiting review"
            );
            return Ok(Decision::NoOp);
        }

        let issue = self
            .tracker
            .get_issue(issue_number)
            .await
            .map_err(TriageError::fetch("issue"))?;
        Ok(decide_issue(self.config, &issue))
    }

    async fn check_comment(&self, event: &Event) -> Result<Decision> {
        let Some(comment_ref) = &event.comment else {
            return Err(TriageError::InvalidPayload(
                "comment event without comment".into(),
            ));
        };

        let state = self.label_state(event.issue_number).await?;
        if !state.has_add_label {
            debug!(
                issue = event.issue_number,
                label = %self.config.label_to_add,
                "Issue is not waiting for information, ignoring comment"
            );
            return Ok(Decision::NoOp);
        }

        if comment_ref.body_missing {
            info!(comment = comment_ref.id, "Delivered comment has no body");
            return Ok(Decision::NoOp);
        }

        let comment = self
            .tracker
            .get_comment(comment_ref.id)
            .await
            .map_err(TriageError::fetch("comment"))?;
        // The delivery's issue and comment are only trusted if they agree.
        if comment.issue_number != Some(event.issue_number) {
            info!(
                issue = event.issue_number,
                comment = comment_ref.id,
                comment_issue = ?comment.issue_number,
                "Comment does not belong to the issue, ignoring"
            );
            return Ok(Decision::NoOp);
        }

        let issue = self
            .tracker
            .get_issue(event.issue_number)
            .await
            .map_err(TriageError::fetch("issue"))?;

        Ok(decide_comment(
            self.config,
            &comment.post,
            issue.author_login.as_deref(),
        ))
    }
}
