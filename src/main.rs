use std::sync::Arc;

use anyhow::Context;

use need_info::config::{RunConfig, TriageConfig};
use need_info::error::ConfigError;
use need_info::tracker::{GitHubTracker, IssueTracker};
use need_info::triage::{Event, TriageProcessor};
use need_info::webhook::webhook_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let serve = match std::env::args().nth(1).as_deref() {
        None => false,
        Some("serve") => true,
        Some(other) => anyhow::bail!("unknown command \"{other}\" (expected: serve)"),
    };

    let run_config = RunConfig::from_env()?;

    // A malformed document stops the run before any event is looked at.
    let config = TriageConfig::load(&run_config.config_path).with_context(|| {
        format!(
            "Invalid configuration in {}, ending run",
            run_config.config_path.display()
        )
    })?;
    tracing::info!(
        path = %run_config.config_path.display(),
        items = config.required_items.len(),
        label = %config.label_to_add,
        "Loaded triage configuration"
    );

    let tracker: Arc<dyn IssueTracker> = Arc::new(GitHubTracker::new(
        &run_config.api_url,
        run_config.owner.clone(),
        run_config.repo.clone(),
        run_config.token.clone(),
    )?);
    let processor = Arc::new(TriageProcessor::new(Arc::new(config), tracker));

    if serve {
        let secret = run_config
            .webhook_secret
            .clone()
            .ok_or_else(|| ConfigError::MissingEnvVar("NEED_INFO_WEBHOOK_SECRET".into()))?;
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", run_config.port))
            .await
            .with_context(|| format!("Failed to bind port {}", run_config.port))?;
        tracing::info!(port = run_config.port, "Webhook server started");
        axum::serve(listener, webhook_routes(processor, secret)).await?;
        return Ok(());
    }

    let event_name = run_config
        .event_name
        .as_deref()
        .context("GITHUB_EVENT_NAME is not set")?;
    let event_path = run_config
        .event_path
        .as_ref()
        .context("GITHUB_EVENT_PATH is not set")?;
    let payload = tokio::fs::read(event_path)
        .await
        .with_context(|| format!("Failed to read event payload {}", event_path.display()))?;

    let event = Event::from_payload(event_name, &payload)?;
    let decision = processor.process(&event).await?;
    tracing::info!(
        issue = event.issue_number,
        decision = decision.label(),
        "Run complete"
    );
    Ok(())
}
