//! Task tracker abstraction.

pub mod asana;

use async_trait::async_trait;

use crate::error::TrackerError;

/// Custom field definition attached to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
    /// Field id
    pub id: String,
    /// Display name
    pub name: String,
}

/// Tracker project with its custom field settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project id
    pub id: String,
    /// Project name
    pub name: String,
    /// Custom fields enabled on the project
    pub custom_fields: Vec<CustomField>,
}

impl Project {
    /// Resolve a custom field by display name.
    pub fn custom_field(&self, name: &str) -> Result<&CustomField, TrackerError> {
        self.custom_fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| TrackerError::FieldMissing {
                field: name.to_string(),
            })
    }
}

/// One custom field assignment in a task update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    /// Custom field id
    pub field_id: String,
    /// New text value
    pub value: String,
}

/// Operations the relay needs from a task tracker.
///
/// Implementations are shared across concurrent deliveries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Fetch a project together with its custom field settings.
    async fn fetch_project(&self, project_id: &str) -> Result<Project, TrackerError>;

    /// Set custom field values on a task in a single call.
    async fn update_task_fields(
        &self,
        task_id: &str,
        fields: &[FieldValue],
    ) -> Result<(), TrackerError>;

    /// Post a comment on a task.
    async fn add_comment(&self, task_id: &str, body: &str) -> Result<(), TrackerError>;
}
