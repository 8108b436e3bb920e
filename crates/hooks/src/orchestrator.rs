//! Per-reference update protocol against the task tracker.
//!
//! For every reference: fetch the project, resolve the last-commit field,
//! then make exactly one mutating call. That call is the field update, or a
//! comment when the field cannot be resolved or updated. Failures never stop
//! the remaining references.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ComposeError;
use crate::message::compose_message;
use crate::models::CommitEvent;
use crate::references::{extract_references, TaskReference};
use crate::tracker::{FieldValue, Project, TaskTracker};

/// Result of processing one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// Custom field set to the commit URL
    FieldUpdated,
    /// Field update was rejected; a comment was attempted instead
    CommentedFallback { comment_posted: bool },
    /// Field could not be resolved on the project; a comment was attempted
    FieldResolutionFailed { comment_posted: bool },
    /// Project could not be fetched; nothing was written
    ProjectFetchFailed,
}

impl UpdateOutcome {
    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FieldUpdated => "field_updated",
            Self::CommentedFallback { .. } => "commented_fallback",
            Self::FieldResolutionFailed { .. } => "field_resolution_failed",
            Self::ProjectFetchFailed => "project_fetch_failed",
        }
    }

    /// Whether the task received any write.
    #[must_use]
    pub const fn task_written(&self) -> bool {
        match self {
            Self::FieldUpdated => true,
            Self::CommentedFallback { comment_posted }
            | Self::FieldResolutionFailed { comment_posted } => *comment_posted,
            Self::ProjectFetchFailed => false,
        }
    }
}

/// Applies commit updates to referenced tasks.
#[derive(Clone)]
pub struct Orchestrator {
    tracker: Arc<dyn TaskTracker>,
    last_commit_field: String,
    message_field: String,
}

impl Orchestrator {
    /// Create an orchestrator using the field names from `config`.
    #[must_use]
    pub fn new(tracker: Arc<dyn TaskTracker>, config: &Config) -> Self {
        Self::with_fields(
            tracker,
            config.last_commit_field_name.clone(),
            config.message_field_name.clone(),
        )
    }

    /// Create an orchestrator with explicit field names.
    #[must_use]
    pub fn with_fields(
        tracker: Arc<dyn TaskTracker>,
        last_commit_field: impl Into<String>,
        message_field: impl Into<String>,
    ) -> Self {
        Self {
            tracker,
            last_commit_field: last_commit_field.into(),
            message_field: message_field.into(),
        }
    }

    /// Relay one commit: compose its notification, extract references and
    /// apply the update to each.
    ///
    /// Native merge commits are rejected with
    /// [`ComposeError::MergeCommitUnsupported`] before any tracker call.
    pub async fn relay_commit(
        &self,
        commit: &CommitEvent,
    ) -> Result<Vec<UpdateOutcome>, ComposeError> {
        let message = compose_message(commit)?;

        let refs = extract_references(&commit.message);
        if refs.is_empty() {
            debug!(commit = %commit.url, "No task references found");
        }

        Ok(self.apply_updates(&refs, commit, Some(&message)).await)
    }

    /// Relay the last commit of a merge request.
    ///
    /// Native merge commits are suppressed on the push hook only, so this
    /// path still updates their references. The message field is left out
    /// when the commit has no composed notification.
    pub async fn relay_merge_request(&self, commit: &CommitEvent) -> Vec<UpdateOutcome> {
        let message = compose_message(commit).ok();

        let refs = extract_references(&commit.message);
        if refs.is_empty() {
            debug!(commit = %commit.url, "No task references found");
        }

        self.apply_updates(&refs, commit, message.as_deref()).await
    }

    /// Apply `commit` to every reference, in order.
    ///
    /// `message` is the composed notification body. It is written to the
    /// message field when the project has one. Returns one outcome per
    /// reference.
    pub async fn apply_updates(
        &self,
        refs: &[TaskReference],
        commit: &CommitEvent,
        message: Option<&str>,
    ) -> Vec<UpdateOutcome> {
        stream::iter(refs)
            .then(|reference| self.apply_one(reference, commit, message))
            .collect()
            .await
    }

    async fn apply_one(
        &self,
        reference: &TaskReference,
        commit: &CommitEvent,
        message: Option<&str>,
    ) -> UpdateOutcome {
        let project = match self.tracker.fetch_project(&reference.project_id).await {
            Ok(project) => project,
            Err(e) => {
                let outcome = UpdateOutcome::ProjectFetchFailed;
                warn!(
                    project_id = %reference.project_id,
                    task_id = %reference.task_id,
                    qualifier = reference.qualifier().unwrap_or("-"),
                    outcome = outcome.as_str(),
                    error = %e,
                    "Failed to fetch project"
                );
                return outcome;
            }
        };

        let field_id = match project.custom_field(&self.last_commit_field) {
            Ok(field) => field.id.clone(),
            Err(e) => {
                let comment_posted = self.comment_fallback(reference, commit).await;
                let outcome = UpdateOutcome::FieldResolutionFailed { comment_posted };
                warn!(
                    project_id = %reference.project_id,
                    task_id = %reference.task_id,
                    qualifier = reference.qualifier().unwrap_or("-"),
                    outcome = outcome.as_str(),
                    comment_posted,
                    error = %e,
                    "Failed to resolve last commit field"
                );
                return outcome;
            }
        };

        let values = self.field_values(&project, field_id, commit, message);

        match self
            .tracker
            .update_task_fields(&reference.task_id, &values)
            .await
        {
            Ok(()) => {
                let outcome = UpdateOutcome::FieldUpdated;
                info!(
                    project_id = %reference.project_id,
                    task_id = %reference.task_id,
                    qualifier = reference.qualifier().unwrap_or("-"),
                    outcome = outcome.as_str(),
                    fields = values.len(),
                    "Updated task"
                );
                outcome
            }
            Err(e) => {
                let comment_posted = self.comment_fallback(reference, commit).await;
                let outcome = UpdateOutcome::CommentedFallback { comment_posted };
                warn!(
                    project_id = %reference.project_id,
                    task_id = %reference.task_id,
                    qualifier = reference.qualifier().unwrap_or("-"),
                    outcome = outcome.as_str(),
                    comment_posted,
                    error = %e,
                    "Failed to update task"
                );
                outcome
            }
        }
    }

    /// Values written by the field update: the trimmed commit URL, plus the
    /// composed message when the project has a message field.
    fn field_values(
        &self,
        project: &Project,
        last_commit_field_id: String,
        commit: &CommitEvent,
        message: Option<&str>,
    ) -> Vec<FieldValue> {
        let mut values = vec![FieldValue {
            field_id: last_commit_field_id,
            value: trim_url(&commit.url).to_string(),
        }];

        if let Some(message) = message {
            match project.custom_field(&self.message_field) {
                Ok(field) => values.push(FieldValue {
                    field_id: field.id.clone(),
                    value: message.to_string(),
                }),
                Err(e) => debug!(project_id = %project.id, error = %e, "Skipping message field"),
            }
        }

        values
    }

    /// Post the raw commit as a comment. Returns whether it was posted.
    async fn comment_fallback(&self, reference: &TaskReference, commit: &CommitEvent) -> bool {
        let body = format!("{}\n\n {}", commit.url, commit.message);

        match self.tracker.add_comment(&reference.task_id, &body).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    project_id = %reference.project_id,
                    task_id = %reference.task_id,
                    error = %e,
                    "Failed to post fallback comment"
                );
                false
            }
        }
    }
}

fn trim_url(url: &str) -> &str {
    url.trim_matches(|c: char| c.is_whitespace() || c.is_control())
}
