//! Error types for need-info.

/// Top-level error for a single triage invocation.
///
/// Every variant is terminal for the invocation that produced it. The only
/// locally recovered failure (label lookup returning "not found") never
/// reaches this type.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported event: {event_name} with action \"{action}\", ending run")]
    UnsupportedEvent { event_name: String, action: String },

    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("Failed to fetch {operation}: {source}")]
    RemoteFetchFailed {
        operation: &'static str,
        #[source]
        source: TrackerError,
    },

    #[error("Failed to {operation}: {source}")]
    RemoteMutationFailed {
        operation: &'static str,
        #[source]
        source: TrackerError,
    },
}

impl TriageError {
    pub(crate) fn fetch(operation: &'static str) -> impl FnOnce(TrackerError) -> Self {
        move |source| Self::RemoteFetchFailed { operation, source }
    }

    pub(crate) fn mutation(operation: &'static str) -> impl FnOnce(TrackerError) -> Self {
        move |source| Self::RemoteMutationFailed { operation, source }
    }
}

/// Configuration errors. All of them abort before any event is processed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by an [`IssueTracker`](crate::tracker::IssueTracker).
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    #[error("{operation} request failed: {reason}")]
    Request { operation: String, reason: String },

    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation} returned an unreadable response: {reason}")]
    Decode { operation: String, reason: String },
}

impl TrackerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Result type alias for triage invocations.
pub type Result<T> = std::result::Result<T, TriageError>;
