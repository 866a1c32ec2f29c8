//! Startup sequence: build sources, bind, validate.
//!
//! The orchestrator runs the pipeline once. Settings only become visible
//! after validation succeeds; any violation aborts startup with every
//! message attached.

use crate::core::binder::SettingsBinder;
use crate::core::layers::{LayeredSourceBuilder, VaultOutcome};
use crate::core::settings::{AppSettings, SECTION_NAME};
use crate::core::validation::SettingsValidator;
use crate::error::{ConfigError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Stage reached by the startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    /// Nothing has run yet.
    Uninitialized,
    /// Every source has been loaded.
    SourcesBuilt,
    /// The merged map was projected into settings.
    Bound,
    /// Settings passed validation; terminal.
    Validated,
    /// Settings were rejected; terminal.
    ValidationFailed,
    /// A source failed or the deadline passed before validation; terminal.
    Aborted,
}

impl StartupState {
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Validated | Self::ValidationFailed | Self::Aborted)
    }
}

/// Settings that passed validation, plus how they were resolved.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    /// The validated, immutable settings.
    pub settings: Arc<AppSettings>,
    /// Environment the sources were built for.
    pub environment: String,
    /// Names of the layers that contributed, lowest precedence first.
    pub sources: Vec<String>,
    /// What the vault step did.
    pub vault: VaultOutcome,
}

/// Runs the startup pipeline.
///
/// # Examples
///
/// ```rust,no_run
/// use funcapp_settings::core::{LayeredSourceBuilder, StartupOrchestrator};
/// use std::time::Duration;
///
/// # async fn example() -> funcapp_settings::error::Result<()> {
/// let resolved = StartupOrchestrator::new(LayeredSourceBuilder::new("Production"))
///     .with_deadline(Duration::from_secs(60))
///     .run()
///     .await?;
/// println!("jwt configured: {}", !resolved.settings.security.jwt_secret.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct StartupOrchestrator {
    sources: LayeredSourceBuilder,
    binder: SettingsBinder,
    validator: SettingsValidator<AppSettings>,
    deadline: Option<Duration>,
    history: Vec<StartupState>,
}

impl StartupOrchestrator {
    /// Orchestrator with the standard binder and validator.
    pub fn new(sources: LayeredSourceBuilder) -> Self {
        Self {
            sources,
            binder: SettingsBinder::new(),
            validator: SettingsValidator::for_app_settings(),
            deadline: None,
            history: vec![StartupState::Uninitialized],
        }
    }

    /// Replace the validator.
    pub fn with_validator(mut self, validator: SettingsValidator<AppSettings>) -> Self {
        self.validator = validator;
        self
    }

    /// Abort if the whole sequence takes longer than `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Current state.
    pub fn state(&self) -> StartupState {
        self.history
            .last()
            .copied()
            .unwrap_or(StartupState::Uninitialized)
    }

    /// Every state visited, in order.
    pub fn history(&self) -> &[StartupState] {
        &self.history
    }

    fn advance(&mut self, next: StartupState) {
        tracing::debug!(from = ?self.state(), to = ?next, "Startup state transition");
        self.history.push(next);
    }

    /// Run the pipeline to a terminal state.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ValidationFailed`] with every violation when the
    ///   settings are rejected
    /// - [`ConfigError::StartupDeadlineExceeded`] if the deadline passes
    /// - any error from loading a required source
    ///
    /// Every exit leaves the orchestrator in a terminal state; a second call
    /// returns [`ConfigError::Other`].
    pub async fn run(&mut self) -> Result<ResolvedSettings> {
        if self.state().is_terminal() {
            return Err(ConfigError::Other(
                "startup sequence has already completed".to_string(),
            ));
        }

        let deadline = self.deadline;
        let result = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.run_stages())
                .await
                .unwrap_or_else(|_| {
                    tracing::error!(?deadline, "Startup did not complete in time");
                    Err(ConfigError::StartupDeadlineExceeded(deadline))
                }),
            None => self.run_stages().await,
        };

        if result.is_err() && !self.state().is_terminal() {
            self.advance(StartupState::Aborted);
        }
        result
    }

    async fn run_stages(&mut self) -> Result<ResolvedSettings> {
        let layered = self.sources.build().await?;
        self.advance(StartupState::SourcesBuilt);

        let bound = self.binder.bind(&layered.merged());
        self.advance(StartupState::Bound);

        if let Err(err) = self.validator.validate_bound(&bound) {
            self.advance(StartupState::ValidationFailed);
            let errors = err.messages();
            for message in &errors {
                tracing::error!(section = SECTION_NAME, "Configuration error: {}", message);
            }
            return Err(ConfigError::ValidationFailed {
                section: SECTION_NAME,
                errors,
            });
        }
        self.advance(StartupState::Validated);

        let sources = layered.layers.iter().map(|l| l.name.clone()).collect();
        tracing::info!(
            environment = %layered.environment,
            vault = ?layered.vault,
            "Configuration validated"
        );

        Ok(ResolvedSettings {
            settings: Arc::new(bound.settings),
            environment: layered.environment,
            sources,
            vault: layered.vault,
        })
    }
}
