//! GitHub tracker: talks to the REST v3 API over reqwest.

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::IssueTracker;
use crate::error::TrackerError;
use crate::triage::types::{CommentInfo, PostInfo};

const API_VERSION: &str = "2022-11-28";

/// Issues carry at most 100 labels on GitHub.
const LABELS_PER_PAGE: &str = "100";

#[derive(Deserialize)]
struct User {
    login: String,
}

/// Shape shared by issue and comment responses.
#[derive(Deserialize)]
struct Post {
    body: Option<String>,
    user: Option<User>,
}

impl From<Post> for PostInfo {
    fn from(post: Post) -> Self {
        Self {
            body: post.body,
            author_login: post.user.map(|u| u.login),
        }
    }
}

#[derive(Deserialize)]
struct Comment {
    #[serde(flatten)]
    post: Post,
    /// `{api}/repos/{owner}/{repo}/issues/{number}`
    issue_url: Option<String>,
}

impl From<Comment> for CommentInfo {
    fn from(comment: Comment) -> Self {
        Self {
            issue_number: comment.issue_url.as_deref().and_then(issue_number_from_url),
            post: comment.post.into(),
        }
    }
}

fn issue_number_from_url(url: &str) -> Option<u64> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

#[derive(Deserialize)]
struct Label {
    name: String,
}

/// One repository on a GitHub (or GitHub Enterprise) instance.
pub struct GitHubTracker {
    client: reqwest::Client,
    base: Url,
    owner: String,
    repo: String,
    token: SecretString,
}

impl GitHubTracker {
    pub fn new(
        api_url: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: SecretString,
    ) -> Result<Self, TrackerError> {
        let base = Url::parse(api_url).map_err(|e| TrackerError::Request {
            operation: "configure client".into(),
            reason: format!("invalid API URL \"{api_url}\": {e}"),
        })?;
        if base.cannot_be_a_base() {
            return Err(TrackerError::Request {
                operation: "configure client".into(),
                reason: format!("API URL \"{api_url}\" cannot carry a path"),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("need-info/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrackerError::Request {
                operation: "configure client".into(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base,
            owner: owner.into(),
            repo: repo.into(),
            token,
        })
    }

    /// `{base}/repos/{owner}/{repo}/{segments...}`, each segment percent-encoded.
    fn repo_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str()])
                .extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(self.token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(
        &self,
        operation: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TrackerError> {
        let response = builder.send().await.map_err(|e| TrackerError::Request {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(operation, status = status.as_u16(), "GitHub request failed");
        if status == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound {
                resource: operation.to_string(),
            });
        }
        Err(TrackerError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_json<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        url: Url,
    ) -> Result<T, TrackerError> {
        let response = self.send(operation, self.request(Method::GET, url)).await?;
        response.json().await.map_err(|e| TrackerError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn get_issue(&self, number: u64) -> Result<PostInfo, TrackerError> {
        let url = self.repo_url(&["issues", &number.to_string()]);
        let post: Post = self.fetch_json("get issue", url).await?;
        Ok(post.into())
    }

    async fn get_comment(&self, id: u64) -> Result<CommentInfo, TrackerError> {
        let url = self.repo_url(&["issues", "comments", &id.to_string()]);
        let comment: Comment = self.fetch_json("get comment", url).await?;
        Ok(comment.into())
    }

    async fn list_labels(&self, number: u64) -> Result<Vec<String>, TrackerError> {
        let mut url = self.repo_url(&["issues", &number.to_string(), "labels"]);
        url.query_pairs_mut().append_pair("per_page", LABELS_PER_PAGE);
        let labels: Vec<Label> = self.fetch_json("list labels", url).await?;
        Ok(labels.into_iter().map(|l| l.name).collect())
    }

    async fn label_exists(&self, name: &str) -> Result<bool, TrackerError> {
        let url = self.repo_url(&["labels", name]);
        match self.send("get label", self.request(Method::GET, url)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_label(&self, name: &str, color: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&["labels"]);
        let body = serde_json::json!({ "name": name, "color": color });
        let request = self.request(Method::POST, url).json(&body);
        match self.send("create label", request).await {
            Ok(_) => {
                tracing::info!(label = %name, color = %color, "Created label");
                Ok(())
            }
            // Another delivery created it between our lookup and this call.
            Err(TrackerError::Status { status: 422, body, .. })
                if body.contains("already_exists") =>
            {
                Err(TrackerError::AlreadyExists {
                    resource: format!("label \"{name}\""),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn add_label(&self, number: u64, name: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&["issues", &number.to_string(), "labels"]);
        let body = serde_json::json!({ "labels": [name] });
        self.send("add label", self.request(Method::POST, url).json(&body))
            .await?;
        Ok(())
    }

    async fn remove_label(&self, number: u64, name: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&["issues", &number.to_string(), "labels", name]);
        self.send("remove label", self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&["issues", &number.to_string(), "comments"]);
        let payload = serde_json::json!({ "body": body });
        self.send("create comment", self.request(Method::POST, url).json(&payload))
            .await?;
        Ok(())
    }
}
