//! Configuration loader that reads sources in precedence order.

use crate::core::RawConfigMap;
use crate::core::binder::merge_layers;
use crate::error::{ConfigError, Result};
use crate::sources::{ConfigSource, SourceKind};

/// Values contributed by one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedLayer {
    /// Origin of the values.
    pub kind: SourceKind,
    /// Source name, for logs.
    pub name: String,
    /// Precedence; later (higher) layers win.
    pub priority: i32,
    /// The flat values.
    pub values: RawConfigMap,
}

/// Loads configuration from multiple sources.
///
/// Sources are read lowest priority first. Sources with equal priority keep
/// the order they were added in.
pub struct ConfigLoader {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a configuration source.
    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
    }

    fn sorted(&self) -> Vec<&dyn ConfigSource> {
        let mut sorted: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
        sorted.sort_by_key(|s| s.priority());
        sorted
    }

    /// Read every source into its own layer.
    ///
    /// An optional source that fails is logged as a warning and contributes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if no sources were added or a required source fails.
    pub async fn load_layers(&self) -> Result<Vec<LoadedLayer>> {
        if self.sources.is_empty() {
            return Err(ConfigError::LoadError(
                "No configuration sources specified".to_string(),
            ));
        }

        let mut layers = Vec::with_capacity(self.sources.len());
        for source in self.sorted() {
            match source.load().await {
                Ok(values) => {
                    tracing::debug!(source = %source.name(), keys = values.len(), "Loaded configuration source");
                    layers.push(LoadedLayer {
                        kind: source.kind(),
                        name: source.name(),
                        priority: source.priority(),
                        values,
                    });
                }
                Err(e) if source.is_optional() => {
                    tracing::warn!(
                        source = %source.name(),
                        error = %e,
                        "Configuration source unavailable; continuing without it"
                    );
                }
                Err(e) => {
                    return Err(ConfigError::LoadError(format!(
                        "Failed to load source '{}': {}",
                        source.name(),
                        e
                    )));
                }
            }
        }
        Ok(layers)
    }

    /// Load all sources and merge them into one map.
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::load_layers`].
    pub async fn load(&self) -> Result<RawConfigMap> {
        Ok(merge_layers(&self.load_layers().await?))
    }

    /// Get the list of source names in priority order.
    pub fn source_names(&self) -> Vec<String> {
        self.sorted().iter().map(|s| s.name()).collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
