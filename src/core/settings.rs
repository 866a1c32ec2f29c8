//! Typed application settings.

/// Configuration section the settings are bound from.
pub const SECTION_NAME: &str = "AppSettings";

/// Default database command timeout, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT: i32 = 30;
/// Default database retry count.
pub const DEFAULT_MAX_RETRY_COUNT: i32 = 3;
/// Default external API timeout, in seconds.
pub const DEFAULT_API_TIMEOUT_SECONDS: i32 = 30;
/// Default token lifetime, in minutes.
pub const DEFAULT_TOKEN_EXPIRATION_MINUTES: i32 = 60;

/// Settings bound from the `AppSettings` section.
///
/// Built once at startup and never mutated afterwards. Required fields
/// (environment, database connection string, API base URL and key, JWT
/// secret) are empty when unset; validation rejects that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSettings {
    /// Deployment environment name.
    pub environment: String,
    /// Telemetry connection string, if any.
    pub application_insights_connection_string: Option<String>,
    /// Database access.
    pub database: DatabaseSettings,
    /// Downstream HTTP API.
    pub external_api: ExternalApiSettings,
    /// Token and CORS settings.
    pub security: SecuritySettings,
}

/// `AppSettings:Database`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Connection string (required).
    pub connection_string: String,
    /// Command timeout in seconds.
    pub command_timeout: i32,
    /// Retries for transient failures.
    pub max_retry_count: i32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_retry_count: DEFAULT_MAX_RETRY_COUNT,
        }
    }
}

/// `AppSettings:ExternalApi`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalApiSettings {
    /// Absolute base URL (required).
    pub base_url: String,
    /// API key (required).
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: i32,
}

impl Default for ExternalApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_seconds: DEFAULT_API_TIMEOUT_SECONDS,
        }
    }
}

/// `AppSettings:Security`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuritySettings {
    /// Token signing secret (required).
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub token_expiration_minutes: i32,
    /// CORS origins.
    pub allowed_origins: Vec<String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiration_minutes: DEFAULT_TOKEN_EXPIRATION_MINUTES,
            allowed_origins: Vec::new(),
        }
    }
}
