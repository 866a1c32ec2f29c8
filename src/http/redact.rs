//! Redacted view of [`AppSettings`] for the config endpoint.
//!
//! Secrets are replaced by presence flags; nothing secret is ever
//! serialized.

use crate::core::{AppSettings, DatabaseSettings, ExternalApiSettings, SecuritySettings};
use serde::Serialize;

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Serializable, secret-free projection of the settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedSettings {
    /// Deployment environment name.
    pub environment: String,
    /// Whether a telemetry connection string is configured.
    pub has_application_insights_connection_string: bool,
    /// Database section.
    pub database: RedactedDatabase,
    /// External API section.
    pub external_api: RedactedExternalApi,
    /// Security section.
    pub security: RedactedSecurity,
}

/// `AppSettings:Database` without the connection string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedDatabase {
    /// Whether a connection string is configured.
    pub has_connection_string: bool,
    /// Command timeout in seconds.
    pub command_timeout: i32,
    /// Retries for transient failures.
    pub max_retry_count: i32,
}

/// `AppSettings:ExternalApi` without the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedExternalApi {
    /// Base URL of the API.
    pub base_url: String,
    /// Whether an API key is configured.
    pub has_api_key: bool,
    /// Request timeout in seconds.
    pub timeout_seconds: i32,
}

/// `AppSettings:Security` without the signing secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedSecurity {
    /// Whether a JWT secret is configured.
    pub has_jwt_secret: bool,
    /// Token lifetime in minutes.
    pub token_expiration_minutes: i32,
    /// CORS origins.
    pub allowed_origins: Vec<String>,
}

impl From<&DatabaseSettings> for RedactedDatabase {
    fn from(db: &DatabaseSettings) -> Self {
        Self {
            has_connection_string: present(&db.connection_string),
            command_timeout: db.command_timeout,
            max_retry_count: db.max_retry_count,
        }
    }
}

impl From<&ExternalApiSettings> for RedactedExternalApi {
    fn from(api: &ExternalApiSettings) -> Self {
        Self {
            base_url: api.base_url.clone(),
            has_api_key: present(&api.api_key),
            timeout_seconds: api.timeout_seconds,
        }
    }
}

impl From<&SecuritySettings> for RedactedSecurity {
    fn from(security: &SecuritySettings) -> Self {
        Self {
            has_jwt_secret: present(&security.jwt_secret),
            token_expiration_minutes: security.token_expiration_minutes,
            allowed_origins: security.allowed_origins.clone(),
        }
    }
}

impl From<&AppSettings> for RedactedSettings {
    fn from(settings: &AppSettings) -> Self {
        Self {
            environment: settings.environment.clone(),
            has_application_insights_connection_string: settings
                .application_insights_connection_string
                .as_deref()
                .is_some_and(present),
            database: (&settings.database).into(),
            external_api: (&settings.external_api).into(),
            security: (&settings.security).into(),
        }
    }
}
