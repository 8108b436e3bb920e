//! GitLab webhook authentication and header parsing.

use subtle::ConstantTimeEq;

/// Header carrying the shared secret configured on the GitLab webhook.
pub const GITLAB_TOKEN_HEADER: &str = "x-gitlab-token";

/// Header naming the hook type, e.g. `Push Hook`.
pub const GITLAB_EVENT_HEADER: &str = "x-gitlab-event";

/// Header carrying the unique delivery id.
pub const GITLAB_DELIVERY_HEADER: &str = "x-gitlab-event-uuid";

/// Check a presented token against the accepted set.
///
/// Every candidate is compared in constant time.
#[must_use]
pub fn verify_gitlab_token(presented: &str, accepted: &[String]) -> bool {
    accepted.iter().fold(false, |found, token| {
        let matched: bool = token.as_bytes().ct_eq(presented.as_bytes()).into();
        found | matched
    })
}

/// Parsed webhook headers
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    /// Secret token
    pub token: Option<String>,
    /// Hook type
    pub event_type: Option<String>,
    /// Unique delivery id
    pub delivery_id: Option<String>,
}

impl WebhookHeaders {
    /// Parse headers from a request
    #[must_use]
    pub fn from_header_map(get_header: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            token: get_header(GITLAB_TOKEN_HEADER),
            event_type: get_header(GITLAB_EVENT_HEADER),
            delivery_id: get_header(GITLAB_DELIVERY_HEADER),
        }
    }

    /// Whether the request carries one of the accepted tokens.
    #[must_use]
    pub fn is_authorized(&self, accepted: &[String]) -> bool {
        self.token
            .as_deref()
            .is_some_and(|token| verify_gitlab_token(token, accepted))
    }
}
