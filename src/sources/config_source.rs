//! Configuration source trait.

use crate::core::RawConfigMap;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Where a source's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The base settings file.
    File,
    /// The environment-specific settings file.
    EnvironmentFile,
    /// Developer-local secrets, only ever present in development.
    LocalSecrets,
    /// Process environment variables.
    EnvVars,
    /// Remote secret vault.
    Vault,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::EnvironmentFile => "environment-file",
            Self::LocalSecrets => "local-secrets",
            Self::EnvVars => "env-vars",
            Self::Vault => "vault",
        };
        f.write_str(name)
    }
}

/// Trait for configuration sources.
///
/// A source yields flat `section:field` pairs. The loader merges sources in
/// priority order, so values from higher priority sources win.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Load configuration as a flat key-value map.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be loaded or parsed.
    async fn load(&self) -> Result<RawConfigMap>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;

    /// Origin of this source's values.
    fn kind(&self) -> SourceKind;

    /// Get the priority of this source (higher = takes precedence).
    ///
    /// Default priorities:
    /// - Vault: 400
    /// - Environment variables: 300
    /// - Local secrets: 250
    /// - Environment-specific file: 200
    /// - Default file: 100
    fn priority(&self) -> i32 {
        100
    }

    /// Whether a failure to load this source may be ignored.
    fn is_optional(&self) -> bool {
        true
    }
}
