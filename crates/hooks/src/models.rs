//! GitLab webhook payloads and the commit event derived from them.

use serde::Deserialize;

/// A single commit to relay to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    /// Web URL of the commit
    pub url: String,
    /// Full commit message
    pub message: String,
}

/// GitLab commit as sent in push and merge-request hooks (simplified)
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabCommit {
    /// Full commit message
    pub message: String,
    /// Commit web URL
    pub url: String,
}

impl From<GitlabCommit> for CommitEvent {
    fn from(commit: GitlabCommit) -> Self {
        Self {
            url: commit.url,
            message: commit.message,
        }
    }
}

/// GitLab merge request hook payload (simplified)
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestHook {
    /// Merge request details
    pub object_attributes: MergeRequestAttributes,
}

/// Merge request attributes
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestAttributes {
    /// Merge request web URL
    #[serde(default)]
    pub url: Option<String>,
    /// Merge request action (open, update, merge, ...)
    #[serde(default)]
    pub action: Option<String>,
    /// Most recent commit on the source branch
    pub last_commit: GitlabCommit,
}

/// GitLab push hook payload (simplified)
#[derive(Debug, Clone, Deserialize)]
pub struct PushHook {
    /// Pushed ref, e.g. `refs/heads/main`
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// Commits included in the push
    #[serde(default)]
    pub commits: Vec<GitlabCommit>,
}

/// Strip the `refs/heads/` prefix from a pushed ref.
///
/// `refs/heads/feature-123` becomes `feature-123`; other refs are returned as-is.
#[must_use]
pub fn branch_name_from_ref(ref_name: &str) -> &str {
    ref_name.strip_prefix("refs/heads/").unwrap_or(ref_name)
}
