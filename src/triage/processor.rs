//! Runs one invocation end to end: classify, decide, execute.

use std::sync::Arc;

use tracing::info;

use crate::config::TriageConfig;
use crate::error::Result;
use crate::tracker::IssueTracker;
use crate::triage::classifier::classify_event;
use crate::triage::engine::DecisionEngine;
use crate::triage::executor::Executor;
use crate::triage::types::{Decision, Event, EventName};

/// Owns the immutable configuration and the tracker for a run.
///
/// Cheap to share between webhook deliveries; no state is kept between
/// calls to [`process`](Self::process).
pub struct TriageProcessor {
    config: Arc<TriageConfig>,
    tracker: Arc<dyn IssueTracker>,
}

impl TriageProcessor {
    pub fn new(config: Arc<TriageConfig>, tracker: Arc<dyn IssueTracker>) -> Self {
        Self { config, tracker }
    }

    /// Process a single event and return the decision that was applied.
    pub async fn process(&self, event: &Event) -> Result<Decision> {
        // Foreign events carry no issue; the classifier rejects them next.
        if let EventName::Other(name) = &event.name {
            info!(event = %name, action = %event.action, "Processing event");
        } else {
            info!(
                event = event.name.as_str(),
                action = %event.action,
                issue = event.issue_number,
                "Processing event"
            );
        }

        let intent = classify_event(event)?;

        let decision = DecisionEngine::new(&self.config, self.tracker.as_ref())
            .decide(event, intent)
            .await?;
        info!(
            issue = event.issue_number,
            intent = ?intent,
            decision = decision.label(),
            "Decided"
        );

        Executor::new(&self.config, self.tracker.as_ref())
            .apply(event.issue_number, &decision)
            .await?;

        Ok(decision)
    }
}
