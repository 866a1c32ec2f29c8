//! Core configuration types: the raw map, binding, validation and startup.

mod binder;
mod layers;
mod loader;
mod map;
mod settings;
mod startup;
mod validation;

pub use binder::{BindingError, BoundSettings, SettingsBinder, merge_layers, parse_bool, parse_int};
pub use layers::{
    DEFAULT_ENVIRONMENT, DEFAULT_VAULT_TIMEOUT, LOCAL_DEVELOPMENT, LayeredSourceBuilder,
    LayeredSources, SourceDescriptor, VAULT_ENABLED_KEY, VAULT_TIMEOUT_KEY, VAULT_URL_KEY,
    VaultOutcome, VaultSkipReason,
};
pub use loader::{ConfigLoader, LoadedLayer};
pub use map::{KEY_DELIMITER, RawConfigMap};
pub use settings::{
    AppSettings, DEFAULT_API_TIMEOUT_SECONDS, DEFAULT_COMMAND_TIMEOUT, DEFAULT_MAX_RETRY_COUNT,
    DEFAULT_TOKEN_EXPIRATION_MINUTES, DatabaseSettings, ExternalApiSettings, SECTION_NAME,
    SecuritySettings,
};
pub use startup::{ResolvedSettings, StartupOrchestrator, StartupState};
pub use validation::{CustomCheck, Rule, SettingsValidator, Validate};
