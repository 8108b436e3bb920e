//! REST client for the Asana API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{CustomField, FieldValue, Project, TaskTracker};
use crate::config::DEFAULT_ASANA_API_URL;
use crate::error::TrackerError;

/// Fields requested when fetching a project.
const PROJECT_OPT_FIELDS: &str = "name,custom_field_settings.custom_field.name";

/// Asana REST client
#[derive(Debug, Clone)]
pub struct AsanaClient {
    client: reqwest::Client,
    api_url: String,
}

/// Asana wraps every payload in a `data` envelope
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Asana error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    gid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    custom_field_settings: Vec<CustomFieldSetting>,
}

#[derive(Debug, Deserialize)]
struct CustomFieldSetting {
    custom_field: CustomFieldResponse,
}

#[derive(Debug, Deserialize)]
struct CustomFieldResponse {
    gid: String,
    #[serde(default)]
    name: String,
}

impl From<ProjectResponse> for Project {
    fn from(project: ProjectResponse) -> Self {
        Self {
            id: project.gid,
            name: project.name,
            custom_fields: project
                .custom_field_settings
                .into_iter()
                .map(|s| CustomField {
                    id: s.custom_field.gid,
                    name: s.custom_field.name,
                })
                .collect(),
        }
    }
}

impl AsanaClient {
    /// Create a client against the public Asana API.
    ///
    /// # Arguments
    /// * `access_token` - Asana personal access token
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_url(access_token, DEFAULT_ASANA_API_URL)
    }

    /// Create a client against a custom base URL (proxies, tests).
    pub fn with_url(access_token: &str, api_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}"))
                .context("Invalid access token")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    /// Accept only ids that are a single, unreserved path segment.
    fn path_id(id: &str) -> Result<&str, TrackerError> {
        let valid = !id.is_empty()
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Ok(id)
        } else {
            Err(TrackerError::InvalidId { id: id.to_string() })
        }
    }

    /// Send a request and map non-2xx responses to [`TrackerError::Api`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, TrackerError> {
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .map(|b| {
                b.errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|m| !m.is_empty())
            .unwrap_or(body);

        Err(TrackerError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, TrackerError> {
        let body = response.text().await?;
        let envelope: Envelope<R> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl TaskTracker for AsanaClient {
    #[instrument(skip(self))]
    async fn fetch_project(&self, project_id: &str) -> Result<Project, TrackerError> {
        let project_id = Self::path_id(project_id)?;
        let request = self
            .client
            .get(self.url(&format!("/projects/{project_id}")))
            .query(&[("opt_fields", PROJECT_OPT_FIELDS)]);

        let project: ProjectResponse = Self::decode(self.send(request).await?).await?;
        debug!(
            project = %project.gid,
            fields = project.custom_field_settings.len(),
            "Fetched Asana project"
        );
        Ok(project.into())
    }

    #[instrument(skip(self, values), fields(count = values.len()))]
    async fn update_task_fields(
        &self,
        task_id: &str,
        values: &[FieldValue],
    ) -> Result<(), TrackerError> {
        let task_id = Self::path_id(task_id)?;
        let custom_fields: Map<String, Value> = values
            .iter()
            .map(|f| (f.field_id.clone(), Value::String(f.value.clone())))
            .collect();

        let body = Envelope {
            data: serde_json::json!({ "custom_fields": custom_fields }),
        };

        self.send(
            self.client
                .put(self.url(&format!("/tasks/{task_id}")))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, body))]
    async fn add_comment(&self, task_id: &str, body: &str) -> Result<(), TrackerError> {
        let task_id = Self::path_id(task_id)?;
        let payload = Envelope {
            data: serde_json::json!({ "text": body }),
        };

        self.send(
            self.client
                .post(self.url(&format!("/tasks/{task_id}/stories")))
                .json(&payload),
        )
        .await?;
        Ok(())
    }
}
