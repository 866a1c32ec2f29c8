//! Error types for funcapp-settings.

use std::fmt;
use std::time::Duration;

/// Result type alias for funcapp-settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while resolving and validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to load configuration from a source.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Failed to parse a configuration document.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// The bound settings did not pass validation.
    #[error("Configuration validation failed for {section}: {}", .errors.join(", "))]
    ValidationFailed {
        /// Configuration section that was validated
        section: &'static str,
        /// Every violation, in evaluation order
        errors: Vec<String>,
    },

    /// The secret vault could not be read.
    #[error("Key Vault error: {0}")]
    Vault(#[from] VaultError),

    /// The startup sequence did not finish before the host deadline.
    #[error("Startup did not complete within {0:?}")]
    StartupDeadlineExceeded(Duration),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

/// Failures of the vault step.
///
/// Every variant is recoverable at startup: the layered builder downgrades
/// them to warnings and continues without vault-sourced values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    /// No ambient credential could be found in the environment.
    #[error("no ambient credential available: {0}")]
    CredentialUnavailable(String),

    /// A credential was found but the token request failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The vault URL is not a valid absolute URL.
    #[error("invalid vault URL '{0}'")]
    InvalidUrl(String),

    /// The vault could not be reached.
    #[error("vault unreachable: {0}")]
    Unreachable(String),

    /// The vault answered with a non-success status.
    #[error("vault returned HTTP {status} for {path}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request path that failed
        path: String,
    },

    /// The vault answered with a body that could not be understood.
    #[error("unexpected vault response: {0}")]
    InvalidResponse(String),

    /// The fetch did not complete within the allotted time.
    #[error("vault fetch timed out after {0:?}")]
    Timeout(Duration),

    /// A `KeyVault` setting holds a value of the wrong type.
    #[error("invalid setting {key} = '{value}'")]
    InvalidSetting {
        /// Configuration key
        key: String,
        /// The offending raw value
        value: String,
    },

    /// Vault support was not compiled in.
    #[error("vault support is not enabled (build with the 'vault' feature)")]
    FeatureDisabled,
}

/// Validation error for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name/path
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Flatten into one display message per violation, preserving order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(Self::messages).collect(),
            other => vec![other.to_string()],
        }
    }

    /// Number of individual violations.
    pub fn len(&self) -> usize {
        match self {
            Self::Multiple(errors) => errors.iter().map(Self::len).sum(),
            _ => 1,
        }
    }

    /// True when this is an empty `Multiple`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => write!(f, "{} [{}]", reason, field),
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::ValidationFailed {
            section: crate::core::SECTION_NAME,
            errors: err.messages(),
        }
    }
}
