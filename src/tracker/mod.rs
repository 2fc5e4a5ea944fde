//! Issue tracker collaborator.
//!
//! The triage core reads and mutates remote state only through
//! [`IssueTracker`]. Nothing is cached between calls; every read reflects the
//! tracker's current state.

pub mod github;
pub mod memory;

pub use github::GitHubTracker;
pub use memory::InMemoryTracker;

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::triage::types::{CommentInfo, PostInfo};

/// Backend-agnostic access to one repository's issues, comments and labels.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Body and author of an issue.
    async fn get_issue(&self, number: u64) -> Result<PostInfo, TrackerError>;

    /// Body and author of an issue comment, and the issue it belongs to.
    async fn get_comment(&self, id: u64) -> Result<CommentInfo, TrackerError>;

    /// Names of the labels currently on an issue.
    async fn list_labels(&self, number: u64) -> Result<Vec<String>, TrackerError>;

    /// Whether the repository defines a label called `name`.
    async fn label_exists(&self, name: &str) -> Result<bool, TrackerError>;

    /// Define a repository label. Fails with [`TrackerError::AlreadyExists`]
    /// when a label of that name is already defined.
    async fn create_label(&self, name: &str, color: &str) -> Result<(), TrackerError>;

    async fn add_label(&self, number: u64, name: &str) -> Result<(), TrackerError>;

    /// Remove a label from an issue. Fails with [`TrackerError::NotFound`]
    /// when the issue does not carry it.
    async fn remove_label(&self, number: u64, name: &str) -> Result<(), TrackerError>;

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), TrackerError>;
}
