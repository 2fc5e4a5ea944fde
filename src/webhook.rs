//! Webhook receiver.
//!
//! Each delivery to `POST /webhook` is one triage invocation. The event name
//! comes from the `X-GitHub-Event` header and the body is the raw payload.
//! Deliveries must carry an `X-Hub-Signature-256` HMAC of the body made with
//! the shared webhook secret; anything else is refused before it is parsed.
//! Failures are answered with a status code the sender can act on: remote
//! failures are worth redelivering, unsupported events are not.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use sha2::Sha256;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::error::TriageError;
use crate::triage::{Event, TriageProcessor};

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

type HmacSha256 = Hmac<Sha256>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<TriageProcessor>,
    pub secret: Arc<SecretString>,
}

/// Build the Axum router for webhook deliveries signed with `secret`.
pub fn webhook_routes(processor: Arc<TriageProcessor>, secret: SecretString) -> Router {
    Router::new()
        .route("/webhook", post(receive))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(AppState {
            processor,
            secret: Arc::new(secret),
        })
}

/// Check a `sha256=<hex>` signature header against the HMAC-SHA256 of `body`.
pub fn verify_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let Some(digest) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    // Constant-time comparison.
    mac.verify_slice(&expected).is_ok()
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "need-info"
    }))
}

async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let delivery = header(DELIVERY_HEADER).unwrap_or("-");

    let signed = header(SIGNATURE_HEADER)
        .is_some_and(|sig| verify_signature(&body, sig, state.secret.expose_secret()));
    if !signed {
        warn!(delivery, "Webhook signature missing or invalid, refusing delivery");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid X-Hub-Signature-256" })),
        );
    }

    let Some(event_name) = header(EVENT_HEADER) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing X-GitHub-Event header" })),
        );
    };
    debug!(delivery, event = event_name, "Webhook delivery received");

    // Sent once when the hook is registered.
    if event_name == "ping" {
        return (StatusCode::OK, Json(json!({ "status": "pong" })));
    }

    let event = match Event::from_payload(event_name, &body) {
        Ok(event) => event,
        Err(e) => return error_response(delivery, &e),
    };

    match state.processor.process(&event).await {
        Ok(decision) => (
            StatusCode::OK,
            Json(json!({
                "issue": event.issue_number,
                "result": decision,
            })),
        ),
        Err(e) => error_response(delivery, &e),
    }
}

fn error_response(delivery: &str, err: &TriageError) -> (StatusCode, Json<Value>) {
    let status = match err {
        TriageError::UnsupportedEvent { .. } => StatusCode::ACCEPTED,
        TriageError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        TriageError::RemoteFetchFailed { .. } | TriageError::RemoteMutationFailed { .. } => {
            StatusCode::BAD_GATEWAY
        }
        TriageError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(delivery, error = %err, "Webhook delivery failed");
    } else {
        warn!(delivery, error = %err, "Webhook delivery rejected");
    }
    (status, Json(json!({ "error": err.to_string() })))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{RequiredItem, TriageConfig};
    use crate::tracker::InMemoryTracker;
    use crate::triage::PostInfo;

    fn router(tracker: InMemoryTracker) -> (Router, Arc<InMemoryTracker>) {
        let config = TriageConfig {
            required_items: vec![RequiredItem {
                content: vec!["steps to reproduce".into()],
                response: "Please add repro steps".into(),
                require_all: true,
            }],
            label_to_add: "need more info".into(),
            labels_to_check: vec!["bug".into()],
            comment_header: String::new(),
            comment_footer: String::new(),
            exempt_users: vec![],
            label_color: "fbca04".into(),
        };
        let tracker = Arc::new(tracker);
        let processor = TriageProcessor::new(Arc::new(config), tracker.clone());
        let routes = webhook_routes(Arc::new(processor), SecretString::from(SECRET));
        (routes, tracker)
    }

    const SECRET: &str = "hook-secret";

    fn sign(body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(body.as_bytes());
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn request(event: Option<&str>, signature: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some(event) = event {
            builder = builder.header("X-GitHub-Event", event);
        }
        if let Some(signature) = signature {
            builder = builder.header("X-Hub-Signature-256", signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// A correctly signed delivery.
    fn delivery(event: Option<&str>, body: &str) -> Request<Body> {
        request(event, Some(sign(body).as_str()), body)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = router(InMemoryTracker::new());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn flags_incomplete_issue() {
        let tracker = InMemoryTracker::new()
            .with_issue(4, PostInfo::new("it crashes", "alice"))
            .with_issue_labels(4, &["bug"]);
        let (app, tracker) = router(tracker);

        let response = app
            .oneshot(delivery(
                Some("issues"),
                r#"{"action":"opened","issue":{"number":4}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["issue"], 4);
        assert_eq!(body["result"]["decision"], "add_label_and_comment");
        assert!(tracker.labels_on(4).await.contains(&"need more info".to_string()));
    }

    #[tokio::test]
    async fn unsupported_event_is_accepted_without_action() {
        let (app, tracker) = router(InMemoryTracker::new());
        let response = app
            .oneshot(delivery(
                Some("pull_request"),
                r#"{"action":"opened","pull_request":{"number":1}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(tracker.calls().await.is_empty());
    }

    #[tokio::test]
    async fn missing_event_header_is_bad_request() {
        let (app, _) = router(InMemoryTracker::new());
        let response = app.oneshot(delivery(None, "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_payload_is_bad_request() {
        let (app, _) = router(InMemoryTracker::new());
        let response = app
            .oneshot(delivery(Some("issues"), r#"{"issue":{"number":1}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ping_is_answered() {
        let (app, _) = router(InMemoryTracker::new());
        let response = app
            .oneshot(delivery(Some("ping"), r#"{"zen":"Keep it logically awesome."}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "pong");
    }

    #[test]
    fn verifies_github_reference_signature() {
        let signature = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
        assert!(verify_signature(
            b"Hello, World!",
            signature,
            "It's a Secret to Everybody"
        ));
        assert!(!verify_signature(b"Hello, World!", signature, "wrong secret"));
        assert!(!verify_signature(b"Hello, World?", signature, "It's a Secret to Everybody"));
    }

    #[test]
    fn rejects_malformed_signatures() {
        let body = b"{}";
        assert!(!verify_signature(body, "", SECRET));
        assert!(!verify_signature(body, "sha1=abcd", SECRET));
        assert!(!verify_signature(body, "sha256=not-hex", SECRET));
        assert!(verify_signature(body, &sign("{}"), SECRET));
    }

    #[tokio::test]
    async fn unsigned_delivery_is_refused() {
        let tracker = InMemoryTracker::new()
            .with_issue(1, PostInfo::new("it crashes", "alice"))
            .with_comment(1, 50, PostInfo::new("steps to reproduce: x", "alice"))
            .with_issue_labels(1, &["bug", "need more info"]);
        let (app, tracker) = router(tracker);

        let body = r#"{"action":"created","issue":{"number":1},"comment":{"id":50,"body":"x"}}"#;
        let response = app
            .oneshot(request(Some("issue_comment"), None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(tracker.calls().await.is_empty());
        assert_eq!(tracker.labels_on(1).await, vec!["bug", "need more info"]);
    }

    #[tokio::test]
    async fn signature_over_other_body_is_refused() {
        let (app, tracker) = router(InMemoryTracker::new());
        let body = r#"{"action":"opened","issue":{"number":4}}"#;
        let signature = sign(r#"{"action":"opened","issue":{"number":5}}"#);
        let response = app
            .oneshot(request(Some("issues"), Some(signature.as_str()), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(tracker.calls().await.is_empty());
    }

    #[tokio::test]
    async fn comment_paired_with_wrong_issue_changes_nothing() {
        // Comment 50 lives on issue 2.
        let tracker = InMemoryTracker::new()
            .with_issue(1, PostInfo::new("it crashes", "alice"))
            .with_comment(2, 50, PostInfo::new("steps to reproduce: x", "alice"))
            .with_issue_labels(1, &["bug", "need more info"]);
        let (app, tracker) = router(tracker);

        let response = app
            .oneshot(delivery(
                Some("issue_comment"),
                r#"{"action":"created","issue":{"number":1},"comment":{"id":50,"body":"x"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["result"]["decision"], "no_op");
        assert_eq!(tracker.labels_on(1).await, vec!["bug", "need more info"]);
    }

    #[tokio::test]
    async fn remote_failure_is_bad_gateway() {
        let (app, _) = router(InMemoryTracker::new().failing("list_labels"));
        let response = app
            .oneshot(delivery(
                Some("issues"),
                r#"{"action":"edited","issue":{"number":1}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
