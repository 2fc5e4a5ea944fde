//! In-memory issue tracker.
//!
//! Mirrors the GitHub semantics the triage core depends on (label removal of
//! an absent label is `NotFound`, adding a label is idempotent) and records
//! every call so callers can assert on what was fetched and mutated.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::IssueTracker;
use crate::error::TrackerError;
use crate::triage::types::{CommentInfo, PostInfo};

#[derive(Default)]
struct State {
    issues: HashMap<u64, PostInfo>,
    comments: HashMap<u64, CommentInfo>,
    issue_labels: HashMap<u64, BTreeSet<String>>,
    /// Repository label name → color.
    repo_labels: BTreeMap<String, String>,
    posted: Vec<(u64, String)>,
    calls: Vec<&'static str>,
    failing: HashSet<&'static str>,
    /// `label_exists` always answers `false`.
    stale_label_lookups: bool,
}

impl State {
    fn record(&mut self, operation: &'static str) -> Result<(), TrackerError> {
        self.calls.push(operation);
        if self.failing.contains(operation) {
            return Err(TrackerError::Request {
                operation: operation.to_string(),
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }
}

/// Tracker backed by process memory.
#[derive(Default)]
pub struct InMemoryTracker {
    state: Mutex<State>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(mut self, number: u64, issue: PostInfo) -> Self {
        self.state.get_mut().issues.insert(number, issue);
        self
    }

    /// Add comment `id`, posted on issue `issue_number`.
    pub fn with_comment(mut self, issue_number: u64, id: u64, comment: PostInfo) -> Self {
        self.state.get_mut().comments.insert(
            id,
            CommentInfo {
                issue_number: Some(issue_number),
                post: comment,
            },
        );
        self
    }

    /// Put labels on an issue, defining them in the repository as well.
    pub fn with_issue_labels(mut self, number: u64, labels: &[&str]) -> Self {
        let state = self.state.get_mut();
        for label in labels {
            state
                .repo_labels
                .entry(label.to_string())
                .or_insert_with(|| "ededed".to_string());
            state
                .issue_labels
                .entry(number)
                .or_default()
                .insert(label.to_string());
        }
        self
    }

    pub fn with_repo_label(mut self, name: &str, color: &str) -> Self {
        self.state
            .get_mut()
            .repo_labels
            .insert(name.to_string(), color.to_string());
        self
    }

    /// Make every call to `operation` (e.g. `"add_label"`) fail.
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.state.get_mut().failing.insert(operation);
        self
    }

    /// Report every repository label as missing, as a lookup that raced a
    /// concurrent creation would.
    pub fn with_stale_label_lookups(mut self) -> Self {
        self.state.get_mut().stale_label_lookups = true;
        self
    }

    pub async fn labels_on(&self, number: u64) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .issue_labels
            .get(&number)
            .map(|labels| labels.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Bodies of the comments posted on an issue through this tracker.
    pub async fn comments_on(&self, number: u64) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .posted
            .iter()
            .filter(|(n, _)| *n == number)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub async fn repo_label_color(&self, name: &str) -> Option<String> {
        self.state.lock().await.repo_labels.get(name).cloned()
    }

    /// Operation names in call order.
    pub async fn calls(&self) -> Vec<&'static str> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn get_issue(&self, number: u64) -> Result<PostInfo, TrackerError> {
        let mut state = self.state.lock().await;
        state.record("get_issue")?;
        state
            .issues
            .get(&number)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound {
                resource: format!("issue #{number}"),
            })
    }

    async fn get_comment(&self, id: u64) -> Result<CommentInfo, TrackerError> {
        let mut state = self.state.lock().await;
        state.record("get_comment")?;
        state
            .comments
            .get(&id)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound {
                resource: format!("comment {id}"),
            })
    }

    async fn list_labels(&self, number: u64) -> Result<Vec<String>, TrackerError> {
        let mut state = self.state.lock().await;
        state.record("list_labels")?;
        Ok(state
            .issue_labels
            .get(&number)
            .map(|labels| labels.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn label_exists(&self, name: &str) -> Result<bool, TrackerError> {
        let mut state = self.state.lock().await;
        state.record("label_exists")?;
        Ok(!state.stale_label_lookups && state.repo_labels.contains_key(name))
    }

    async fn create_label(&self, name: &str, color: &str) -> Result<(), TrackerError> {
        let mut state = self.state.lock().await;
        state.record("create_label")?;
        if state.repo_labels.contains_key(name) {
            return Err(TrackerError::AlreadyExists {
                resource: format!("label \"{name}\""),
            });
        }
        state.repo_labels.insert(name.to_string(), color.to_string());
        Ok(())
    }

    async fn add_label(&self, number: u64, name: &str) -> Result<(), TrackerError> {
        let mut state = self.state.lock().await;
        state.record("add_label")?;
        state
            .repo_labels
            .entry(name.to_string())
            .or_insert_with(|| "ededed".to_string());
        state
            .issue_labels
            .entry(number)
            .or_default()
            .insert(name.to_string());
        Ok(())
    }

    async fn remove_label(&self, number: u64, name: &str) -> Result<(), TrackerError> {
        let mut state = self.state.lock().await;
        state.record("remove_label")?;
        let removed = state
            .issue_labels
            .get_mut(&number)
            .is_some_and(|labels| labels.remove(name));
        if removed {
            Ok(())
        } else {
            Err(TrackerError::NotFound {
                resource: format!("label \"{name}\" on issue #{number}"),
            })
        }
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        let mut state = self.state.lock().await;
        state.record("create_comment")?;
        state.posted.push((number, body.to_string()));
        Ok(())
    }
}
