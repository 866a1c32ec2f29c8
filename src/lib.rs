//! # funcapp-settings
//!
//! Layered, eagerly validated configuration for a serverless HTTP function app.
//!
//! ## Overview
//!
//! Settings are resolved once at startup from, lowest precedence first:
//! - `appsettings.json`
//! - `appsettings.<Environment>.json`
//! - developer-local secrets (Development only)
//! - environment variables (`Section__Field`)
//! - Azure Key Vault (everywhere except Development)
//!
//! The merged map is bound into [`core::AppSettings`] and validated. Any
//! violation aborts startup; otherwise the settings are shared read-only with
//! the [`http`] handlers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use funcapp_settings::prelude::*;
//!
//! # async fn example() -> funcapp_settings::error::Result<()> {
//! let resolved = StartupOrchestrator::new(
//!     LayeredSourceBuilder::new("Staging").with_config_dir("/home/site/wwwroot"),
//! )
//! .run()
//! .await?;
//!
//! println!("API base URL: {}", resolved.settings.external_api.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `vault` (default): Key Vault client and ambient credentials. Without it
//!   a configured vault URL is reported as a warning and skipped.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod http;
pub mod logging;
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        AppSettings, LayeredSourceBuilder, ResolvedSettings, SettingsValidator,
        StartupOrchestrator, Validate,
    };
    pub use crate::error::{ConfigError, Result, ValidationError};
}
