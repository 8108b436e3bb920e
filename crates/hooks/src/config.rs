//! Configuration for the hooks service.

use std::env;
use std::fmt;

use crate::error::ConfigError;

/// Default Asana REST endpoint.
pub const DEFAULT_ASANA_API_URL: &str = "https://app.asana.com/api/1.0";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LAST_COMMIT_FIELD: &str = "Last Commit";
const DEFAULT_MESSAGE_FIELD: &str = "Message";

/// Hooks service configuration.
///
/// Built once at startup and shared read-only with every request.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Asana personal access token.
    pub asana_api_key: String,
    /// Asana REST base URL.
    pub asana_api_url: String,
    /// Accepted values of the `X-Gitlab-Token` header.
    pub gitlab_secret_tokens: Vec<String>,
    /// Display name of the task field that receives the last commit URL.
    pub last_commit_field_name: String,
    /// Display name of the task field that receives the commit message.
    pub message_field_name: String,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    /// when one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv_loaded(dotenvy::dotenv().map(drop))?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let asana_api_key = get("ASANA_API_KEY").ok_or(ConfigError::Missing("ASANA_API_KEY"))?;

        let gitlab_secret_tokens: Vec<String> = get("GITLAB_SECRET_TOKENS")
            .ok_or(ConfigError::Missing("GITLAB_SECRET_TOKENS"))?
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        if gitlab_secret_tokens.is_empty() {
            return Err(ConfigError::Invalid {
                name: "GITLAB_SECRET_TOKENS",
                reason: "no tokens after splitting on ','".to_string(),
            });
        }

        let port = match get("HOOKS_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "HOOKS_PORT",
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            asana_api_key,
            asana_api_url: get("ASANA_API_URL")
                .unwrap_or_else(|| DEFAULT_ASANA_API_URL.to_string()),
            gitlab_secret_tokens,
            last_commit_field_name: get("LAST_COMMIT_FIELD_NAME")
                .unwrap_or_else(|| DEFAULT_LAST_COMMIT_FIELD.to_string()),
            message_field_name: get("MESSAGE_COMMIT_FIELD_NAME")
                .unwrap_or_else(|| DEFAULT_MESSAGE_FIELD.to_string()),
        })
    }
}

/// Treat a missing `.env` as the normal case; surface every other failure.
fn dotenv_loaded(result: Result<(), dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Err(e) if !e.not_found() => Err(e.into()),
        _ => Ok(()),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("asana_api_key", &"<redacted>")
            .field("asana_api_url", &self.asana_api_url)
            .field("gitlab_secret_tokens", &self.gitlab_secret_tokens.len())
            .field("last_commit_field_name", &self.last_commit_field_name)
            .field("message_field_name", &self.message_field_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let missing = dotenvy::Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            ".env not found",
        ));
        assert!(dotenv_loaded(Err(missing)).is_ok());
        assert!(dotenv_loaded(Ok(())).is_ok());
    }

    #[test]
    fn test_unreadable_or_malformed_dotenv_is_reported() {
        let denied = dotenvy::Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        assert!(matches!(
            dotenv_loaded(Err(denied)),
            Err(ConfigError::DotEnv(_))
        ));

        let malformed = dotenvy::Error::LineParse("KEY='unterminated".to_string(), 4);
        assert!(matches!(
            dotenv_loaded(Err(malformed)),
            Err(ConfigError::DotEnv(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("ASANA_API_KEY", "key"),
            ("GITLAB_SECRET_TOKENS", "one"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.asana_api_url, DEFAULT_ASANA_API_URL);
        assert_eq!(config.last_commit_field_name, "Last Commit");
        assert_eq!(config.message_field_name, "Message");
        assert_eq!(config.gitlab_secret_tokens, vec!["one".to_string()]);
    }

    #[test]
    fn test_tokens_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("ASANA_API_KEY", "key"),
            ("GITLAB_SECRET_TOKENS", " a, b ,,c "),
        ]))
        .unwrap();

        assert_eq!(config.gitlab_secret_tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ASANA_API_KEY", "key"),
            ("GITLAB_SECRET_TOKENS", "t"),
            ("HOOKS_PORT", "9000"),
            ("LAST_COMMIT_FIELD_NAME", "Commit"),
            ("MESSAGE_COMMIT_FIELD_NAME", "Notes"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.last_commit_field_name, "Commit");
        assert_eq!(config.message_field_name, "Notes");
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::from_lookup(lookup(&[("GITLAB_SECRET_TOKENS", "t")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ASANA_API_KEY")));
    }

    #[test]
    fn test_empty_token_list_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("ASANA_API_KEY", "key"),
            ("GITLAB_SECRET_TOKENS", " , "),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "GITLAB_SECRET_TOKENS",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[
            ("ASANA_API_KEY", "key"),
            ("GITLAB_SECRET_TOKENS", "t"),
            ("HOOKS_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "HOOKS_PORT", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup(&[
            ("ASANA_API_KEY", "super-secret"),
            ("GITLAB_SECRET_TOKENS", "token-value"),
        ]))
        .unwrap();

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("token-value"));
    }
}
