//! Projection of the merged key/value map into [`AppSettings`].
//!
//! A value that is present but malformed is a binding error: the field keeps
//! its default and the error travels with the settings into validation, which
//! rejects them. Binding never fails on its own and is deterministic.

use crate::core::settings::{
    AppSettings, DEFAULT_API_TIMEOUT_SECONDS, DEFAULT_COMMAND_TIMEOUT, DEFAULT_MAX_RETRY_COUNT,
    DEFAULT_TOKEN_EXPIRATION_MINUTES, DatabaseSettings, ExternalApiSettings, SECTION_NAME,
    SecuritySettings,
};
use crate::core::{LoadedLayer, RawConfigMap};

/// A present value that could not be coerced to the field's type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{key} must be {expected} (got '{value}')")]
pub struct BindingError {
    /// Full configuration key, e.g. `AppSettings:Database:CommandTimeout`
    pub key: String,
    /// Human description of the expected type
    pub expected: &'static str,
    /// The offending raw value
    pub value: String,
}

/// Settings plus any binding errors met while producing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSettings {
    /// The projected settings; malformed fields hold their defaults.
    pub settings: AppSettings,
    /// Binding errors in field order.
    pub errors: Vec<BindingError>,
}

/// Parse an integer from decimal text.
pub fn parse_int(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

/// Parse a case-insensitive `true`/`false`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Merge loaded layers in order; later layers win per key.
pub fn merge_layers(layers: &[LoadedLayer]) -> RawConfigMap {
    let mut merged = RawConfigMap::new();
    for layer in layers {
        merged.merge(layer.values.clone());
    }
    merged
}

/// Binds the `AppSettings` section of a [`RawConfigMap`].
#[derive(Debug, Clone)]
pub struct SettingsBinder {
    section: String,
}

impl SettingsBinder {
    /// Binder for the standard section.
    pub fn new() -> Self {
        Self {
            section: SECTION_NAME.to_string(),
        }
    }

    /// Bind from a differently named section.
    pub fn with_section(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
        }
    }

    /// Project `map` into settings.
    pub fn bind(&self, map: &RawConfigMap) -> BoundSettings {
        let mut reader = FieldReader {
            map,
            section: &self.section,
            errors: Vec::new(),
        };

        let settings = AppSettings {
            environment: reader.string("Environment"),
            application_insights_connection_string: reader
                .optional_string("ApplicationInsightsConnectionString"),
            database: DatabaseSettings {
                connection_string: reader.string("Database:ConnectionString"),
                command_timeout: reader.int("Database:CommandTimeout", DEFAULT_COMMAND_TIMEOUT),
                max_retry_count: reader.int("Database:MaxRetryCount", DEFAULT_MAX_RETRY_COUNT),
            },
            external_api: ExternalApiSettings {
                base_url: reader.string("ExternalApi:BaseUrl"),
                api_key: reader.string("ExternalApi:ApiKey"),
                timeout_seconds: reader.int("ExternalApi:TimeoutSeconds", DEFAULT_API_TIMEOUT_SECONDS),
            },
            security: SecuritySettings {
                jwt_secret: reader.string("Security:JwtSecret"),
                token_expiration_minutes: reader.int(
                    "Security:TokenExpirationMinutes",
                    DEFAULT_TOKEN_EXPIRATION_MINUTES,
                ),
                allowed_origins: reader.list("Security:AllowedOrigins"),
            },
        };

        BoundSettings {
            settings,
            errors: reader.errors,
        }
    }

    /// Merge `layers` and bind the result.
    pub fn bind_layers(&self, layers: &[LoadedLayer]) -> BoundSettings {
        self.bind(&merge_layers(layers))
    }
}

impl Default for SettingsBinder {
    fn default() -> Self {
        Self::new()
    }
}

struct FieldReader<'a> {
    map: &'a RawConfigMap,
    section: &'a str,
    errors: Vec<BindingError>,
}

impl FieldReader<'_> {
    fn key(&self, path: &str) -> String {
        RawConfigMap::join(self.section, path)
    }

    fn string(&self, path: &str) -> String {
        self.map.get(&self.key(path)).unwrap_or_default().to_string()
    }

    fn optional_string(&self, path: &str) -> Option<String> {
        self.map
            .get(&self.key(path))
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    }

    fn int(&mut self, path: &str, default: i32) -> i32 {
        let key = self.key(path);
        let map = self.map;
        let Some(raw) = map.get(&key) else {
            return default;
        };
        match parse_int(raw) {
            Some(value) => value,
            None => {
                self.errors.push(BindingError {
                    key,
                    expected: "an integer",
                    value: raw.to_string(),
                });
                default
            }
        }
    }

    fn list(&self, path: &str) -> Vec<String> {
        self.map.list(&self.key(path))
    }
}
