//! Configuration source implementations.

mod config_source;
mod env;
mod file;
mod local_secrets;

#[cfg(feature = "vault")]
mod credential;
#[cfg(feature = "vault")]
mod vault;

pub use config_source::{ConfigSource, SourceKind};
pub use env::{DEFAULT_SEPARATOR, EnvSource, process_vars};
pub use file::FileSource;
pub use local_secrets::LocalSecretsSource;

#[cfg(feature = "vault")]
pub use credential::{AmbientCredential, AmbientEnvironment, TokenCredential};
#[cfg(feature = "vault")]
pub use vault::{KeyVaultSource, secret_name_to_key};
