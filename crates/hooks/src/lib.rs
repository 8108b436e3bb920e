//! GitLab webhook relay for Asana.
//!
//! This crate provides:
//! - Extraction of `ref|<task url>` references from commit messages
//! - Merge-commit classification and comment composition
//! - An Asana REST client behind the [`TaskTracker`] trait
//! - Per-reference update orchestration with a comment fallback
//! - HTTP server for the GitLab push and merge-request hooks

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Most tracker calls can fail

pub mod config;
pub mod error;
pub mod message;
pub mod models;
pub mod orchestrator;
pub mod references;
pub mod server;
pub mod tracker;
pub mod webhooks;

pub use config::Config;
pub use error::{ComposeError, ConfigError, TrackerError};
pub use message::{classify, compose_message, CommitKind};
pub use models::CommitEvent;
pub use orchestrator::{Orchestrator, UpdateOutcome};
pub use references::{extract_references, strip_references, TaskReference};
pub use tracker::{asana::AsanaClient, CustomField, Project, TaskTracker};
