//! Merge-commit classification and comment composition.
//!
//! Push and merge-request hooks both fire for the same change. Native merge
//! commits are suppressed so a task does not receive the same notice twice.

use crate::error::ComposeError;
use crate::models::CommitEvent;
use crate::references::strip_references;

/// Prefix GitLab writes on native merge commits.
const NATIVE_MERGE_PREFIX: &str = "Merge branch";

/// Marker written by the external integration that imitates merge commits.
const SYNTHETIC_MERGE_MARKER: &str = "is merged into";

/// How a commit message should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// Native merge commit; never notified.
    Genuine,
    /// Merge-like message from an upstream integration; notified verbatim.
    SyntheticMerge,
    /// Regular commit.
    Normal,
}

/// Classify a commit message.
///
/// The synthetic marker is checked first, so a message carrying both the
/// marker and the native prefix is treated as synthetic.
#[must_use]
pub fn classify(message: &str) -> CommitKind {
    if message.contains(SYNTHETIC_MERGE_MARKER) {
        CommitKind::SyntheticMerge
    } else if message.starts_with(NATIVE_MERGE_PREFIX) {
        CommitKind::Genuine
    } else {
        CommitKind::Normal
    }
}

/// Build the notification body for a commit.
///
/// Regular commits have their task references stripped since the update
/// itself already links the task.
pub fn compose_message(event: &CommitEvent) -> Result<String, ComposeError> {
    match classify(&event.message) {
        CommitKind::SyntheticMerge => Ok(format!("{}\n\n{}", event.url, event.message)),
        CommitKind::Genuine => Err(ComposeError::MergeCommitUnsupported),
        CommitKind::Normal => Ok(format!(
            "{}\n\n{}",
            event.url,
            strip_references(&event.message)
        )),
    }
}
