//! File-based configuration source.

use super::{ConfigSource, SourceKind};
use crate::core::RawConfigMap;
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use config::{File, FileFormat, Source};
use std::path::{Path, PathBuf};

/// JSON settings file (`appsettings.json` and friends).
///
/// A missing optional file yields an empty map. A file that exists but does
/// not parse is always an error; the caller decides whether that is fatal.
///
/// # Examples
///
/// ```rust,no_run
/// use funcapp_settings::sources::{FileSource, SourceKind};
///
/// let source = FileSource::new("appsettings.Production.json")
///     .with_kind(SourceKind::EnvironmentFile)
///     .with_priority(200);
/// ```
pub struct FileSource {
    path: PathBuf,
    kind: SourceKind,
    priority: i32,
    optional: bool,
}

impl FileSource {
    /// Create an optional file source for the base settings file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: SourceKind::File,
            priority: 100,
            optional: true,
        }
    }

    /// Set the origin kind reported for this file.
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the priority for this source.
    ///
    /// Higher priority sources override lower priority ones.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Make absence of the file an error.
    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    /// Path this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn validate_extension(&self) -> Result<()> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(()),
            Some(ext) => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}. Supported: .json",
                ext
            ))),
            None => Err(ConfigError::LoadError(format!(
                "Unable to determine file format for: {}",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    async fn load(&self) -> Result<RawConfigMap> {
        self.validate_extension()?;

        if !self.path.exists() {
            if self.optional {
                tracing::debug!(path = %self.path.display(), "Optional settings file not present");
                return Ok(RawConfigMap::new());
            }
            return Err(ConfigError::LoadError(format!(
                "Configuration file not found: {}",
                self.path.display()
            )));
        }

        let values = File::from(self.path.clone())
            .format(FileFormat::Json)
            .required(true)
            .collect()
            .map_err(|e| {
                ConfigError::ParseError(format!("{}: {}", self.path.display(), e))
            })?;

        Ok(RawConfigMap::from_config_values(values))
    }

    fn name(&self) -> String {
        format!("{}:{}", self.kind, self.path.display())
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_optional(&self) -> bool {
        self.optional
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_extension() {
        assert!(FileSource::new("appsettings.json").validate_extension().is_ok());
        assert!(FileSource::new("APPSETTINGS.JSON").validate_extension().is_ok());
        assert!(FileSource::new("appsettings.yaml").validate_extension().is_err());
        assert!(FileSource::new("appsettings").validate_extension().is_err());
    }

    #[tokio::test]
    async fn test_load_nested_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("appsettings.json");
        fs::write(
            &path,
            r#"{
  "AppSettings": {
    "Environment": "Staging",
    "Database": { "CommandTimeout": 45 },
    "Security": { "AllowedOrigins": ["https://a.example", "https://b.example"] }
  },
  "KeyVault": { "Url": "" }
}"#,
        )
        .unwrap();

        let map = FileSource::new(&path).load().await.unwrap();

        assert_eq!(map.get("AppSettings:Environment"), Some("Staging"));
        assert_eq!(map.get("AppSettings:Database:CommandTimeout"), Some("45"));
        assert_eq!(
            map.list("AppSettings:Security:AllowedOrigins"),
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(map.get("KeyVault:Url"), Some(""));
    }

    #[tokio::test]
    async fn test_missing_optional_file_is_empty() {
        let source = FileSource::new("/nonexistent/appsettings.json");
        let map = source.load().await.unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_file_fails() {
        let source = FileSource::new("/nonexistent/appsettings.json").required();
        assert!(!source.is_optional());
        assert!(matches!(source.load().await, Err(ConfigError::LoadError(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("appsettings.json");
        fs::write(&path, "{ \"AppSettings\": ").unwrap();

        let result = FileSource::new(&path).load().await;
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_name_and_priority() {
        let source = FileSource::new("appsettings.Staging.json")
            .with_kind(SourceKind::EnvironmentFile)
            .with_priority(200);
        assert_eq!(source.name(), "environment-file:appsettings.Staging.json");
        assert_eq!(source.priority(), 200);
        assert_eq!(source.kind(), SourceKind::EnvironmentFile);
    }
}
