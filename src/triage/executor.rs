//! Applies a [`Decision`] to the tracker.
//!
//! Comment first, then label, so the explanation is visible by the time the
//! label notification goes out. A failure after the comment was posted is
//! reported as is; nothing already written is rolled back.

use tracing::{debug, info};

use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use crate::tracker::IssueTracker;
use crate::triage::types::Decision;

/// `header`, blank line, one response per line, blank line, `footer`.
pub fn compose_comment(header: &str, responses: &[String], footer: &str) -> String {
    format!("{header}\n\n{}\n\n{footer}", responses.join("\n"))
}

pub struct Executor<'a> {
    config: &'a TriageConfig,
    tracker: &'a dyn IssueTracker,
}

impl<'a> Executor<'a> {
    pub fn new(config: &'a TriageConfig, tracker: &'a dyn IssueTracker) -> Self {
        Self { config, tracker }
    }

    pub async fn apply(&self, issue_number: u64, decision: &Decision) -> Result<()> {
        match decision {
            Decision::NoOp => {
                debug!(issue = issue_number, "Nothing to apply");
                Ok(())
            }
            Decision::AddLabelAndComment { responses } => {
                self.add_label_and_comment(issue_number, responses).await
            }
            Decision::RemoveLabel => self.remove_label(issue_number).await,
        }
    }

    async fn add_label_and_comment(&self, issue_number: u64, responses: &[String]) -> Result<()> {
        let body = compose_comment(
            &self.config.comment_header,
            responses,
            &self.config.comment_footer,
        );
        self.tracker
            .create_comment(issue_number, &body)
            .await
            .map_err(TriageError::mutation("create comment"))?;
        info!(issue = issue_number, missing = responses.len(), "Posted comment");

        self.ensure_label_exists().await?;

        let label = &self.config.label_to_add;
        self.tracker
            .add_label(issue_number, label)
            .await
            .map_err(TriageError::mutation("add label"))?;
        info!(issue = issue_number, label = %label, "Added label");
        Ok(())
    }

    /// Create the label-to-add when the repository does not define it yet.
    async fn ensure_label_exists(&self) -> Result<()> {
        let label = &self.config.label_to_add;
        let exists = match self.tracker.label_exists(label).await {
            Ok(exists) => exists,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(TriageError::fetch("label")(e)),
        };
        if exists {
            return Ok(());
        }

        debug!(label = %label, "Label missing, creating it");
        match self
            .tracker
            .create_label(label, &self.config.label_color)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_already_exists() => {
                debug!(label = %label, "Label was created concurrently");
                Ok(())
            }
            Err(e) => Err(TriageError::mutation("create label")(e)),
        }
    }

    async fn remove_label(&self, issue_number: u64) -> Result<()> {
        let label = &self.config.label_to_add;
        match self.tracker.remove_label(issue_number, label).await {
            Ok(()) => {
                info!(issue = issue_number, label = %label, "Removed label");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!(issue = issue_number, label = %label, "Label already removed");
                Ok(())
            }
            Err(e) => Err(TriageError::mutation("remove label")(e)),
        }
    }
}
