//! Environment variable configuration source.

use super::{ConfigSource, SourceKind};
use crate::core::{KEY_DELIMITER, RawConfigMap};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use config::{Environment, Source};
use std::collections::HashMap;

/// Default separator for nested keys (`AppSettings__Database__ConnectionString`).
pub const DEFAULT_SEPARATOR: &str = "__";

/// Snapshot of the process environment.
///
/// Variables whose name or value is not valid UTF-8 are skipped.
pub fn process_vars() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                tracing::debug!(
                    key = %key.unwrap_or_else(|k| k.to_string_lossy().into_owned()),
                    "Skipping environment variable that is not valid UTF-8"
                );
                None
            }
        })
        .collect()
}

/// Environment variable configuration source.
///
/// Every variable is read unless a prefix is set. The separator flattens to
/// the hierarchical key delimiter, so `Security__JwtSecret` becomes
/// `security:jwtsecret`.
///
/// # Examples
///
/// ```rust
/// use funcapp_settings::sources::EnvSource;
///
/// // AppSettings__Database__CommandTimeout=60 -> appsettings:database:commandtimeout
/// let source = EnvSource::new();
/// ```
pub struct EnvSource {
    prefix: Option<String>,
    separator: String,
    priority: i32,
    vars: Option<HashMap<String, String>>,
}

impl EnvSource {
    /// Create a source over the whole process environment.
    pub fn new() -> Self {
        Self {
            prefix: None,
            separator: DEFAULT_SEPARATOR.to_string(),
            priority: 300, // Highest non-vault priority
            vars: None,
        }
    }

    /// Only read variables starting with `<prefix>_`, with the prefix stripped.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the separator for nested keys.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the priority for this source.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Read from the given variables instead of the process environment.
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = Some(vars);
        self
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigSource for EnvSource {
    async fn load(&self) -> Result<RawConfigMap> {
        let mut env_source = match &self.prefix {
            Some(prefix) => Environment::with_prefix(prefix).prefix_separator("_"),
            None => Environment::default(),
        };
        env_source = env_source
            .separator(&self.separator)
            .source(Some(self.vars.clone().unwrap_or_else(process_vars)));

        // The config crate rewrites the separator to '.'
        let values = env_source.collect().map_err(|e| {
            ConfigError::LoadError(format!("Failed to load environment variables: {}", e))
        })?;

        let mut map = RawConfigMap::new();
        for (key, value) in values {
            if let Ok(text) = value.into_string() {
                map.insert(key.replace('.', KEY_DELIMITER), text);
            }
        }
        Ok(map)
    }

    fn name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("env:{}*", prefix),
            None => "env:*".to_string(),
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::EnvVars
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
