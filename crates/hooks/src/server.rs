//! HTTP server for GitLab webhooks.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ComposeError;
use crate::models::{branch_name_from_ref, CommitEvent, MergeRequestHook, PushHook};
use crate::orchestrator::Orchestrator;
use crate::webhooks::WebhookHeaders;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Arc<Config>,
    /// Tracker update orchestrator.
    pub orchestrator: Orchestrator,
}

/// Build the HTTP router for the hooks service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/asana/merge", post(merge_request_handler))
        .route("/api/v1/asana/push", post(push_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handle the GitLab merge request hook.
///
/// Relays the last commit of the merge request. Native merge commits are
/// relayed here as well, since the push hook drops them.
pub async fn merge_request_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    let hook: MergeRequestHook = authorize_and_parse(&state, &headers, &body)?;

    info!(
        merge_request = hook.object_attributes.url.as_deref().unwrap_or("unknown"),
        action = hook.object_attributes.action.as_deref().unwrap_or("unknown"),
        "Processing merge request hook"
    );

    let commit = CommitEvent::from(hook.object_attributes.last_commit);
    let outcomes = state.orchestrator.relay_merge_request(&commit).await;
    debug!(
        commit = %commit.url,
        references = outcomes.len(),
        written = outcomes.iter().filter(|o| o.task_written()).count(),
        "Merge request commit relayed"
    );

    Ok(Json(json!({
        "status": "ok",
        "processed": 1,
        "references": outcomes.len()
    })))
}

/// Handle the GitLab push hook.
///
/// Relays every pushed commit in payload order.
pub async fn push_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    let hook: PushHook = authorize_and_parse(&state, &headers, &body)?;

    info!(
        branch = branch_name_from_ref(&hook.ref_name),
        commits = hook.commits.len(),
        "Processing push hook"
    );

    let commits = hook.commits.into_iter().map(CommitEvent::from).collect();
    Ok(Json(relay_pushed_commits(&state, commits).await))
}

/// Verify the GitLab token and decode the body.
fn authorize_and_parse<T: DeserializeOwned>(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<T, StatusCode> {
    let parsed = WebhookHeaders::from_header_map(|name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    });

    info!(
        event_type = parsed.event_type.as_deref().unwrap_or("unknown"),
        delivery_id = parsed.delivery_id.as_deref().unwrap_or("unknown"),
        "Received GitLab webhook"
    );

    if !parsed.is_authorized(&state.config.gitlab_secret_tokens) {
        warn!("Missing or invalid X-Gitlab-Token header");
        return Err(StatusCode::UNAUTHORIZED);
    }

    serde_json::from_slice(body).map_err(|e| {
        error!(error = %e, "Failed to parse GitLab webhook payload");
        StatusCode::BAD_REQUEST
    })
}

/// Relay pushed commits one after another and summarize the delivery.
///
/// Per-reference outcomes are logged by the orchestrator and never change the
/// response status.
async fn relay_pushed_commits(state: &AppState, commits: Vec<CommitEvent>) -> Value {
    let total = commits.len();
    let mut processed = 0usize;
    let mut suppressed = 0usize;

    for commit in &commits {
        match state.orchestrator.relay_commit(commit).await {
            Ok(outcomes) => {
                processed += 1;
                debug!(
                    commit = %commit.url,
                    references = outcomes.len(),
                    written = outcomes.iter().filter(|o| o.task_written()).count(),
                    "Commit relayed"
                );
            }
            Err(ComposeError::MergeCommitUnsupported) => {
                suppressed += 1;
                debug!(commit = %commit.url, "Skipping merge commit");
            }
        }
    }

    if total > 0 && suppressed == total {
        return json!({
            "status": "ignored",
            "reason": "merge_commit"
        });
    }

    json!({
        "status": "ok",
        "processed": processed,
        "suppressed": suppressed
    })
}
