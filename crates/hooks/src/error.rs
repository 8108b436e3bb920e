//! Error types for the webhook relay.

use thiserror::Error;

/// Errors returned by a [`TaskTracker`](crate::tracker::TaskTracker).
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracker answered with an error status
    #[error("Tracker returned {status}: {message}")]
    Api { status: u16, message: String },

    /// No custom field with the configured display name exists on the project
    #[error("Custom field not found: {field}")]
    FieldMissing { field: String },

    /// Response body could not be decoded
    #[error("Failed to decode tracker response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A project or task id is not a plain path segment
    #[error("Invalid tracker id: {id:?}")]
    InvalidId { id: String },
}

/// Errors from composing a notification body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// Native merge commits are handled by the merge-request hook only.
    #[error("merge commits are not supported")]
    MergeCommitUnsupported,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// A `.env` file exists but could not be read or parsed
    #[error("Failed to load .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}
