//! Environment-aware assembly of the configuration source stack.
//!
//! Precedence, lowest to highest:
//!
//! 1. `appsettings.json`
//! 2. `appsettings.<Environment>.json`
//! 3. developer-local secrets (Development only)
//! 4. process environment variables
//! 5. Key Vault (every environment except Development)
//!
//! The vault URL is read from the merge of layers 1-4. A missing URL is a
//! no-op; a vault that cannot be read is a warning, never a startup failure.

use crate::core::binder::{merge_layers, parse_bool, parse_int};
use crate::core::loader::{ConfigLoader, LoadedLayer};
use crate::core::RawConfigMap;
use crate::error::{Result, VaultError};
use crate::sources::{EnvSource, FileSource, LocalSecretsSource, SourceKind};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "vault")]
use crate::error::ConfigError;
#[cfg(feature = "vault")]
use crate::sources::{
    AmbientCredential, AmbientEnvironment, ConfigSource, KeyVaultSource, TokenCredential,
};
#[cfg(feature = "vault")]
use std::sync::Arc;

/// Environment name that enables local secrets and disables the vault.
pub const LOCAL_DEVELOPMENT: &str = "Development";

/// Environment assumed when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "Production";

/// Key holding the vault URL.
pub const VAULT_URL_KEY: &str = "KeyVault:Url";
/// Optional switch for the vault step.
pub const VAULT_ENABLED_KEY: &str = "KeyVault:Enabled";
/// Optional vault timeout override, in seconds.
pub const VAULT_TIMEOUT_KEY: &str = "KeyVault:TimeoutSeconds";
/// Fallback for the vault timeout.
pub const API_TIMEOUT_KEY: &str = "AppSettings:ExternalApi:TimeoutSeconds";
/// Vault timeout when nothing else is configured.
pub const DEFAULT_VAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BASE_PRIORITY: i32 = 100;
const ENVIRONMENT_FILE_PRIORITY: i32 = 200;
const LOCAL_SECRETS_PRIORITY: i32 = 250;
const ENV_VARS_PRIORITY: i32 = 300;
const VAULT_PRIORITY: i32 = 400;

/// One planned entry of the source stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Origin of the values.
    pub kind: SourceKind,
    /// File path, `env:*`, or the vault URL key.
    pub name: String,
    /// Position in the precedence order.
    pub priority: i32,
    /// Whether absence is tolerated.
    pub optional: bool,
}

/// Why the vault step did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultSkipReason {
    /// Environment is Development.
    LocalDevelopment,
    /// No vault URL configured.
    NotConfigured,
    /// `KeyVault:Enabled` is false.
    Disabled,
}

impl fmt::Display for VaultSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalDevelopment => f.write_str("local development"),
            Self::NotConfigured => f.write_str("no vault URL configured"),
            Self::Disabled => f.write_str("disabled by configuration"),
        }
    }
}

/// What happened in the vault step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultOutcome {
    /// The step was a no-op.
    Skipped(VaultSkipReason),
    /// Secrets were fetched and layered on top.
    Loaded {
        /// Number of secrets merged
        secrets: usize,
    },
    /// The vault was configured but could not be read.
    Failed(VaultError),
}

impl VaultOutcome {
    /// True when the vault was configured but not read.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of the source-building stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredSources {
    /// Environment the stack was built for.
    pub environment: String,
    /// Layers in precedence order, lowest first.
    pub layers: Vec<LoadedLayer>,
    /// Vault step result.
    pub vault: VaultOutcome,
}

impl LayeredSources {
    /// Merge every layer; the last definition of a key wins.
    pub fn merged(&self) -> RawConfigMap {
        merge_layers(&self.layers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum VaultPlan {
    Skip(VaultSkipReason),
    Fetch { url: String, timeout: Duration },
}

fn positive_seconds(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(parse_int)
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::from_secs(u64::from(secs.unsigned_abs())))
}

fn plan_vault(map: &RawConfigMap) -> std::result::Result<VaultPlan, VaultError> {
    if let Some(raw) = map.get(VAULT_ENABLED_KEY) {
        match parse_bool(raw) {
            Some(false) => return Ok(VaultPlan::Skip(VaultSkipReason::Disabled)),
            Some(true) => {}
            None => {
                return Err(VaultError::InvalidSetting {
                    key: VAULT_ENABLED_KEY.to_string(),
                    value: raw.to_string(),
                });
            }
        }
    }

    let url = map.get(VAULT_URL_KEY).unwrap_or_default().trim();
    if url.is_empty() {
        return Ok(VaultPlan::Skip(VaultSkipReason::NotConfigured));
    }

    let timeout = match map.get(VAULT_TIMEOUT_KEY) {
        Some(raw) => positive_seconds(Some(raw)).ok_or_else(|| VaultError::InvalidSetting {
            key: VAULT_TIMEOUT_KEY.to_string(),
            value: raw.to_string(),
        })?,
        None => positive_seconds(map.get(API_TIMEOUT_KEY)).unwrap_or(DEFAULT_VAULT_TIMEOUT),
    };

    Ok(VaultPlan::Fetch {
        url: url.to_string(),
        timeout,
    })
}

/// Builds the ordered source stack for one environment.
///
/// # Examples
///
/// ```rust,no_run
/// use funcapp_settings::core::LayeredSourceBuilder;
///
/// # async fn example() -> funcapp_settings::error::Result<()> {
/// let sources = LayeredSourceBuilder::new("Staging")
///     .with_config_dir("/home/site/wwwroot")
///     .build()
///     .await?;
/// println!("{} layers, vault: {:?}", sources.layers.len(), sources.vault);
/// # Ok(())
/// # }
/// ```
pub struct LayeredSourceBuilder {
    environment: String,
    config_dir: PathBuf,
    base_name: String,
    local_secrets: Option<PathBuf>,
    env_vars: Option<HashMap<String, String>>,
    #[cfg(feature = "vault")]
    credential: Option<Arc<dyn TokenCredential>>,
    #[cfg(feature = "vault")]
    ambient: Option<AmbientEnvironment>,
}

impl LayeredSourceBuilder {
    /// Builder for `environment`; a blank name means [`DEFAULT_ENVIRONMENT`].
    pub fn new(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let environment = if environment.trim().is_empty() {
            DEFAULT_ENVIRONMENT.to_string()
        } else {
            environment.trim().to_string()
        };
        Self {
            environment,
            config_dir: PathBuf::from("."),
            base_name: "appsettings".to_string(),
            local_secrets: None,
            env_vars: None,
            #[cfg(feature = "vault")]
            credential: None,
            #[cfg(feature = "vault")]
            ambient: None,
        }
    }

    /// Directory holding the settings files.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// File stem of the settings files (default `appsettings`).
    pub fn with_base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = name.into();
        self
    }

    /// Developer-local secrets file; only read in Development.
    pub fn with_local_secrets(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_secrets = Some(path.into());
        self
    }

    /// Read environment variables from `vars` instead of the process.
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    /// Use `credential` for the vault instead of the ambient chain.
    #[cfg(feature = "vault")]
    pub fn with_credential(mut self, credential: Arc<dyn TokenCredential>) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Resolve ambient credentials from `ambient` instead of the process.
    #[cfg(feature = "vault")]
    pub fn with_ambient_environment(mut self, ambient: AmbientEnvironment) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Environment this builder targets.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Whether the environment is the local-development one.
    pub fn is_local_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case(LOCAL_DEVELOPMENT)
    }

    fn base_file(&self) -> PathBuf {
        self.config_dir.join(format!("{}.json", self.base_name))
    }

    fn environment_file(&self) -> PathBuf {
        self.config_dir
            .join(format!("{}.{}.json", self.base_name, self.environment))
    }

    /// The planned stack, lowest precedence first.
    pub fn plan(&self) -> Vec<SourceDescriptor> {
        let mut plan = vec![
            SourceDescriptor {
                kind: SourceKind::File,
                name: self.base_file().display().to_string(),
                priority: BASE_PRIORITY,
                optional: true,
            },
            SourceDescriptor {
                kind: SourceKind::EnvironmentFile,
                name: self.environment_file().display().to_string(),
                priority: ENVIRONMENT_FILE_PRIORITY,
                optional: true,
            },
        ];

        if self.is_local_development() {
            if let Some(path) = &self.local_secrets {
                plan.push(SourceDescriptor {
                    kind: SourceKind::LocalSecrets,
                    name: path.display().to_string(),
                    priority: LOCAL_SECRETS_PRIORITY,
                    optional: true,
                });
            }
        }

        plan.push(SourceDescriptor {
            kind: SourceKind::EnvVars,
            name: "env:*".to_string(),
            priority: ENV_VARS_PRIORITY,
            optional: true,
        });

        if !self.is_local_development() {
            plan.push(SourceDescriptor {
                kind: SourceKind::Vault,
                name: VAULT_URL_KEY.to_string(),
                priority: VAULT_PRIORITY,
                optional: true,
            });
        }

        plan
    }

    fn loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        loader.add_source(Box::new(
            FileSource::new(self.base_file()).with_priority(BASE_PRIORITY),
        ));
        loader.add_source(Box::new(
            FileSource::new(self.environment_file())
                .with_kind(SourceKind::EnvironmentFile)
                .with_priority(ENVIRONMENT_FILE_PRIORITY),
        ));

        if self.is_local_development() {
            if let Some(path) = &self.local_secrets {
                loader.add_source(Box::new(LocalSecretsSource::new(path)));
            }
        }

        let mut env = EnvSource::new().with_priority(ENV_VARS_PRIORITY);
        if let Some(vars) = &self.env_vars {
            env = env.with_vars(vars.clone());
        }
        loader.add_source(Box::new(env));
        loader
    }

    /// Load every layer and run the vault step.
    ///
    /// # Errors
    ///
    /// Only a required source failing is an error; the default stack has
    /// none, so in practice this does not fail. Vault problems are reported
    /// through [`LayeredSources::vault`].
    pub async fn build(&self) -> Result<LayeredSources> {
        let mut layers = self.loader().load_layers().await?;

        let vault = if self.is_local_development() {
            tracing::debug!("Skipping Key Vault in local development");
            VaultOutcome::Skipped(VaultSkipReason::LocalDevelopment)
        } else {
            self.vault_step(&merge_layers(&layers), &mut layers).await
        };

        tracing::info!(
            environment = %self.environment,
            layers = layers.len(),
            "Configuration sources built"
        );

        Ok(LayeredSources {
            environment: self.environment.clone(),
            layers,
            vault,
        })
    }

    async fn vault_step(
        &self,
        intermediate: &RawConfigMap,
        layers: &mut Vec<LoadedLayer>,
    ) -> VaultOutcome {
        let (url, timeout) = match plan_vault(intermediate) {
            Ok(VaultPlan::Skip(reason)) => {
                tracing::debug!(%reason, "Skipping Key Vault");
                return VaultOutcome::Skipped(reason);
            }
            Ok(VaultPlan::Fetch { url, timeout }) => (url, timeout),
            Err(e) => {
                tracing::warn!(error = %e, "Key Vault settings invalid; continuing without vault secrets");
                return VaultOutcome::Failed(e);
            }
        };

        match self.fetch_vault(&url, timeout).await {
            Ok(layer) => {
                let secrets = layer.values.len();
                tracing::info!(vault_url = %url, secrets, "Loaded secrets from Key Vault");
                layers.push(layer);
                VaultOutcome::Loaded { secrets }
            }
            Err(e) => {
                tracing::warn!(
                    vault_url = %url,
                    error = %e,
                    "Could not read Key Vault; continuing without vault secrets"
                );
                VaultOutcome::Failed(e)
            }
        }
    }

    #[cfg(feature = "vault")]
    async fn fetch_vault(
        &self,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<LoadedLayer, VaultError> {
        let credential: Arc<dyn TokenCredential> = match &self.credential {
            Some(credential) => Arc::clone(credential),
            None => {
                let ambient = self
                    .ambient
                    .clone()
                    .unwrap_or_else(AmbientEnvironment::from_process);
                let credential = AmbientCredential::resolve(&ambient);
                tracing::debug!(credential = credential.name(), "Resolved ambient credential");
                Arc::new(credential)
            }
        };
        let source = KeyVaultSource::new(url, credential, timeout)?.with_priority(VAULT_PRIORITY);
        let values = source.load().await.map_err(|e| match e {
            ConfigError::Vault(e) => e,
            other => VaultError::InvalidResponse(other.to_string()),
        })?;
        Ok(LoadedLayer {
            kind: source.kind(),
            name: source.name(),
            priority: source.priority(),
            values,
        })
    }

    #[cfg(not(feature = "vault"))]
    async fn fetch_vault(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> std::result::Result<LoadedLayer, VaultError> {
        Err(VaultError::FeatureDisabled)
    }
}
