//! Configuration validation support.
//!
//! Declarative rules and custom checks go through the same evaluator: every
//! violation is collected, in order, and reported together.

use crate::core::binder::BoundSettings;
use crate::core::settings::AppSettings;
use crate::error::ValidationError;
use std::sync::Arc;

/// Trait for configuration validation.
///
/// # Examples
///
/// ```rust
/// use funcapp_settings::core::{AppSettings, Validate};
///
/// let settings = AppSettings::default();
/// let err = settings.validate().unwrap_err();
/// assert_eq!(err.len(), 5);
/// ```
pub trait Validate {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Type alias for custom check functions.
pub type CustomCheck<T> = Arc<dyn Fn(&T) -> Result<(), ValidationError> + Send + Sync>;

/// One declarative rule: a field, a predicate over the settings, a message.
pub struct Rule<T> {
    field: &'static str,
    predicate: Predicate<T>,
    message: &'static str,
}

impl<T: 'static> Rule<T> {
    /// Rule that passes when `predicate` returns true.
    pub fn new(
        field: &'static str,
        message: &'static str,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            field,
            predicate: Box::new(predicate),
            message,
        }
    }

    /// Rule requiring the accessed string to be non-blank.
    pub fn required(field: &'static str, message: &'static str, accessor: fn(&T) -> &str) -> Self {
        Self::new(field, message, move |t| !accessor(t).trim().is_empty())
    }

    /// Field path this rule checks.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Evaluate against `target`, returning the violation if any.
    pub fn evaluate(&self, target: &T) -> Option<ValidationError> {
        if (self.predicate)(target) {
            None
        } else {
            Some(ValidationError::invalid_field(self.field, self.message))
        }
    }
}

/// Aggregating validator over a rule table and custom checks.
pub struct SettingsValidator<T> {
    rules: Vec<Rule<T>>,
    checks: Vec<CustomCheck<T>>,
}

impl<T: 'static> SettingsValidator<T> {
    /// Validator with no rules.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            checks: Vec::new(),
        }
    }

    /// Append a declarative rule.
    pub fn with_rule(mut self, rule: Rule<T>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a custom check; its errors join the same report.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use funcapp_settings::core::{AppSettings, SettingsValidator};
    /// use funcapp_settings::error::ValidationError;
    ///
    /// let validator = SettingsValidator::for_app_settings().with_check(|s: &AppSettings| {
    ///     if s.environment == "Production" && s.security.allowed_origins.is_empty() {
    ///         return Err(ValidationError::invalid_field(
    ///             "AppSettings:Security:AllowedOrigins",
    ///             "Production requires at least one allowed origin",
    ///         ));
    ///     }
    ///     Ok(())
    /// });
    /// ```
    pub fn with_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.checks.push(Arc::new(check));
        self
    }

    /// Number of declarative rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run every rule and check, collecting all violations.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Multiple` holding every violation found.
    pub fn validate(&self, target: &T) -> Result<(), ValidationError> {
        self.collect(target, Vec::new())
    }

    fn collect(&self, target: &T, mut errors: Vec<ValidationError>) -> Result<(), ValidationError> {
        errors.extend(self.rules.iter().filter_map(|rule| rule.evaluate(target)));
        for check in &self.checks {
            if let Err(err) = check(target) {
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl<T: 'static> Default for SettingsValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

impl SettingsValidator<AppSettings> {
    /// The standard rule table for [`AppSettings`].
    pub fn for_app_settings() -> Self {
        Self::new()
            .with_rule(Rule::required(
                "AppSettings:Environment",
                "Environment is required",
                |s: &AppSettings| s.environment.as_str(),
            ))
            .with_rule(Rule::required(
                "AppSettings:Database:ConnectionString",
                "Database connection string is required",
                |s: &AppSettings| s.database.connection_string.as_str(),
            ))
            .with_rule(Rule::required(
                "AppSettings:ExternalApi:BaseUrl",
                "External API base URL is required",
                |s: &AppSettings| s.external_api.base_url.as_str(),
            ))
            .with_rule(Rule::required(
                "AppSettings:ExternalApi:ApiKey",
                "External API key is required",
                |s: &AppSettings| s.external_api.api_key.as_str(),
            ))
            .with_rule(Rule::required(
                "AppSettings:Security:JwtSecret",
                "JWT secret is required",
                |s: &AppSettings| s.security.jwt_secret.as_str(),
            ))
            // Blank URLs are already reported as missing.
            .with_rule(Rule::new(
                "AppSettings:ExternalApi:BaseUrl",
                "External API base URL must be an absolute http(s) URL",
                |s: &AppSettings| {
                    s.external_api.base_url.trim().is_empty() || is_http_url(&s.external_api.base_url)
                },
            ))
            .with_rule(Rule::new(
                "AppSettings:Database:CommandTimeout",
                "Database command timeout must be positive",
                |s: &AppSettings| s.database.command_timeout > 0,
            ))
            .with_rule(Rule::new(
                "AppSettings:Database:MaxRetryCount",
                "Database max retry count must not be negative",
                |s: &AppSettings| s.database.max_retry_count >= 0,
            ))
            .with_rule(Rule::new(
                "AppSettings:ExternalApi:TimeoutSeconds",
                "External API timeout must be positive",
                |s: &AppSettings| s.external_api.timeout_seconds > 0,
            ))
            .with_rule(Rule::new(
                "AppSettings:Security:TokenExpirationMinutes",
                "Token expiration must be positive",
                |s: &AppSettings| s.security.token_expiration_minutes > 0,
            ))
            .with_rule(Rule::new(
                "AppSettings:Security:AllowedOrigins",
                "Allowed origins must not contain blank entries",
                |s: &AppSettings| s.security.allowed_origins.iter().all(|o| !o.trim().is_empty()),
            ))
    }

    /// Validate bound settings; binding errors are reported first.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Multiple` holding every violation found.
    pub fn validate_bound(&self, bound: &BoundSettings) -> Result<(), ValidationError> {
        let binding = bound
            .errors
            .iter()
            .map(|e| ValidationError::custom(e.to_string()))
            .collect();
        self.collect(&bound.settings, binding)
    }
}

impl Validate for AppSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        SettingsValidator::for_app_settings().validate(self)
    }
}
