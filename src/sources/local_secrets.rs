//! Developer-local secrets kept outside the project tree.

use super::{ConfigSource, FileSource, SourceKind};
use crate::core::RawConfigMap;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Secrets file under the developer's home directory.
///
/// The file is the same JSON shape as the settings files; flat keys such as
/// `"AppSettings:Security:JwtSecret"` work as well as nested objects.
pub struct LocalSecretsSource {
    file: FileSource,
}

impl LocalSecretsSource {
    /// Read secrets from an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: FileSource::new(path)
                .with_kind(SourceKind::LocalSecrets)
                .with_priority(250),
        }
    }

    /// Conventional location: `<home>/.microsoft/usersecrets/<id>/secrets.json`.
    pub fn default_path(home: &Path, secrets_id: &str) -> PathBuf {
        home.join(".microsoft")
            .join("usersecrets")
            .join(secrets_id)
            .join("secrets.json")
    }

    /// Path this source reads.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl ConfigSource for LocalSecretsSource {
    async fn load(&self) -> Result<RawConfigMap> {
        self.file.load().await
    }

    fn name(&self) -> String {
        self.file.name()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::LocalSecrets
    }

    fn priority(&self) -> i32 {
        self.file.priority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_path() {
        let path = LocalSecretsSource::default_path(Path::new("/home/dev"), "funcapp");
        assert_eq!(
            path,
            PathBuf::from("/home/dev/.microsoft/usersecrets/funcapp/secrets.json")
        );
    }

    #[tokio::test]
    async fn test_flat_keys_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.json");
        fs::write(&path, r#"{ "AppSettings:Security:JwtSecret": "dev-secret" }"#).unwrap();

        let source = LocalSecretsSource::new(&path);
        let map = source.load().await.unwrap();

        assert_eq!(map.get("AppSettings:Security:JwtSecret"), Some("dev-secret"));
        assert_eq!(source.priority(), 250);
        assert!(source.name().starts_with("local-secrets:"));
    }
}
