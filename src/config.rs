//! Configuration types.
//!
//! Two sources feed an invocation:
//! - the triage document (`.github/need-info.yml`), parsed once into an
//!   immutable [`TriageConfig`] and rejected up front if malformed
//! - the process environment, read into a [`RunConfig`]

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// Color used when the label-to-add has to be created.
pub const DEFAULT_LABEL_COLOR: &str = "fbca04";

const DEFAULT_CONFIG_PATH: &str = ".github/need-info.yml";
const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_PORT: u16 = 8080;

/// A rule describing text that must appear in a post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RequiredItem {
    /// Keywords searched for (case-insensitively) in the post.
    pub content: Vec<String>,
    /// Line added to the bot comment when this item is unmet.
    #[serde(alias = "commentBody")]
    pub response: String,
    /// Every keyword must appear (`true`) or any one of them (`false`).
    pub require_all: bool,
}

/// The triage document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TriageConfig {
    pub required_items: Vec<RequiredItem>,
    pub label_to_add: String,
    pub labels_to_check: Vec<String>,
    #[serde(default)]
    pub comment_header: String,
    #[serde(default)]
    pub comment_footer: String,
    #[serde(default)]
    pub exempt_users: Vec<String>,
    #[serde(default = "default_label_color")]
    pub label_color: String,
}

fn default_label_color() -> String {
    DEFAULT_LABEL_COLOR.to_string()
}

/// serde reports an absent key as "missing field `name`"; surface those as
/// [`ConfigError::MissingRequired`] so the key is named on its own.
fn parse_error(err: serde_yaml::Error) -> ConfigError {
    let message = err.to_string();
    let missing = message
        .split_once("missing field `")
        .and_then(|(_, rest)| rest.split_once('`'))
        .map(|(key, _)| key);
    match missing {
        Some(key) => ConfigError::MissingRequired {
            key: key.to_string(),
        },
        None => ConfigError::Parse(message),
    }
}

impl TriageConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(parse_error)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the document at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Whether `login` belongs to an exempt user.
    pub fn is_exempt(&self, login: &str) -> bool {
        self.exempt_users
            .iter()
            .any(|u| u.eq_ignore_ascii_case(login))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.label_to_add.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "labelToAdd".into(),
                message: "must not be empty".into(),
            });
        }

        for (i, item) in self.required_items.iter().enumerate() {
            if item.content.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("requiredItems[{i}].content"),
                    message: "must list at least one keyword".into(),
                });
            }
            // An empty keyword is a substring of every post.
            if item.content.iter().any(|c| c.is_empty()) {
                return Err(ConfigError::InvalidValue {
                    key: format!("requiredItems[{i}].content"),
                    message: "keywords must not be empty".into(),
                });
            }
        }

        let color = &self.label_color;
        if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidValue {
                key: "labelColor".into(),
                message: format!("expected a 6-digit hex color, got \"{color}\""),
            });
        }

        Ok(())
    }
}

/// Process-level settings taken from the environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub token: SecretString,
    pub owner: String,
    pub repo: String,
    pub api_url: String,
    /// Event name of a one-shot run (`issues`, `issue_comment`, ...).
    pub event_name: Option<String>,
    /// Path to the JSON payload of a one-shot run.
    pub event_path: Option<PathBuf>,
    pub config_path: PathBuf,
    /// Listen port in webhook mode.
    pub port: u16,
    /// Shared secret webhook deliveries are signed with. Required to serve.
    pub webhook_secret: Option<SecretString>,
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("GITHUB_TOKEN")
            .ok_or_else(|| ConfigError::MissingEnvVar("GITHUB_TOKEN".into()))?;

        let repository = get("GITHUB_REPOSITORY")
            .ok_or_else(|| ConfigError::MissingEnvVar("GITHUB_REPOSITORY".into()))?;
        let (owner, repo) = match repository.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                (owner.to_string(), repo.to_string())
            }
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "GITHUB_REPOSITORY".into(),
                    message: format!("expected owner/repo, got \"{repository}\""),
                });
            }
        };

        let port = match get("NEED_INFO_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "NEED_INFO_PORT".into(),
                message: format!("not a port number: \"{raw}\""),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            token: SecretString::from(token),
            owner,
            repo,
            api_url: get("GITHUB_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            event_name: get("GITHUB_EVENT_NAME"),
            event_path: get("GITHUB_EVENT_PATH").map(PathBuf::from),
            config_path: get("NEED_INFO_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            port,
            webhook_secret: get("NEED_INFO_WEBHOOK_SECRET").map(SecretString::from),
        })
    }
}
