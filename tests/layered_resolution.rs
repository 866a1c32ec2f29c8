//! Integration tests for layered source resolution and binding.

use funcapp_settings::core::{
    LayeredSourceBuilder, SettingsBinder, VaultOutcome, VaultSkipReason,
};
use funcapp_settings::sources::SourceKind;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

#[tokio::test]
async fn test_files_and_env_layer_in_order() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "appsettings.json",
        r#"{
            "AppSettings": {
                "Environment": "Base",
                "Database": { "ConnectionString": "Server=base", "CommandTimeout": 10 },
                "ExternalApi": { "BaseUrl": "https://base.example.com" }
            }
        }"#,
    );
    write(
        temp_dir.path(),
        "appsettings.Staging.json",
        r#"{
            "AppSettings": {
                "Environment": "Staging",
                "Database": { "CommandTimeout": 20 }
            }
        }"#,
    );

    let sources = LayeredSourceBuilder::new("Staging")
        .with_config_dir(temp_dir.path())
        .with_env_vars(vars(&[("AppSettings__Database__CommandTimeout", "45")]))
        .build()
        .await
        .unwrap();

    let kinds: Vec<SourceKind> = sources.layers.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![SourceKind::File, SourceKind::EnvironmentFile, SourceKind::EnvVars]
    );
    assert_eq!(
        sources.vault,
        VaultOutcome::Skipped(VaultSkipReason::NotConfigured)
    );

    let bound = SettingsBinder::new().bind(&sources.merged());
    assert!(bound.errors.is_empty());
    assert_eq!(bound.settings.environment, "Staging");
    assert_eq!(bound.settings.database.connection_string, "Server=base");
    assert_eq!(bound.settings.database.command_timeout, 45);
    assert_eq!(bound.settings.external_api.base_url, "https://base.example.com");
}

#[tokio::test]
async fn test_keys_compare_case_insensitively() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "appsettings.json",
        r#"{ "AppSettings": { "Security": { "JwtSecret": "from-file" } } }"#,
    );

    let sources = LayeredSourceBuilder::new("Production")
        .with_config_dir(temp_dir.path())
        .with_env_vars(vars(&[("APPSETTINGS__SECURITY__JWTSECRET", "from-env")]))
        .build()
        .await
        .unwrap();

    let bound = SettingsBinder::new().bind(&sources.merged());
    assert_eq!(bound.settings.security.jwt_secret, "from-env");
}

#[tokio::test]
async fn test_allowed_origins_from_json_array() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "appsettings.json",
        r#"{ "AppSettings": { "Security": { "AllowedOrigins": ["https://a.example", "https://b.example"] } } }"#,
    );

    let sources = LayeredSourceBuilder::new("Production")
        .with_config_dir(temp_dir.path())
        .with_env_vars(HashMap::new())
        .build()
        .await
        .unwrap();

    let bound = SettingsBinder::new().bind(&sources.merged());
    assert_eq!(
        bound.settings.security.allowed_origins,
        vec!["https://a.example", "https://b.example"]
    );
}

#[tokio::test]
async fn test_local_secrets_only_in_development() {
    let temp_dir = TempDir::new().unwrap();
    let secrets = temp_dir.path().join("secrets.json");
    fs::write(&secrets, r#"{ "AppSettings:ExternalApi:ApiKey": "local-key" }"#).unwrap();

    let dev = LayeredSourceBuilder::new("Development")
        .with_config_dir(temp_dir.path())
        .with_local_secrets(&secrets)
        .with_env_vars(HashMap::new())
        .build()
        .await
        .unwrap();
    let bound = SettingsBinder::new().bind(&dev.merged());
    assert_eq!(bound.settings.external_api.api_key, "local-key");
    assert!(dev.layers.iter().any(|l| l.kind == SourceKind::LocalSecrets));

    let prod = LayeredSourceBuilder::new("Production")
        .with_config_dir(temp_dir.path())
        .with_local_secrets(&secrets)
        .with_env_vars(HashMap::new())
        .build()
        .await
        .unwrap();
    let bound = SettingsBinder::new().bind(&prod.merged());
    assert!(bound.settings.external_api.api_key.is_empty());
    assert!(prod.layers.iter().all(|l| l.kind != SourceKind::LocalSecrets));
}

#[tokio::test]
async fn test_env_vars_override_local_secrets() {
    let temp_dir = TempDir::new().unwrap();
    let secrets = temp_dir.path().join("secrets.json");
    fs::write(&secrets, r#"{ "AppSettings": { "Security": { "JwtSecret": "local" } } }"#).unwrap();

    let sources = LayeredSourceBuilder::new("Development")
        .with_config_dir(temp_dir.path())
        .with_local_secrets(&secrets)
        .with_env_vars(vars(&[("AppSettings__Security__JwtSecret", "env")]))
        .build()
        .await
        .unwrap();

    let bound = SettingsBinder::new().bind(&sources.merged());
    assert_eq!(bound.settings.security.jwt_secret, "env");
}

#[tokio::test]
async fn test_unparseable_environment_file_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "appsettings.json",
        r#"{ "AppSettings": { "Environment": "Base" } }"#,
    );
    write(temp_dir.path(), "appsettings.Staging.json", "{ not json");

    let sources = LayeredSourceBuilder::new("Staging")
        .with_config_dir(temp_dir.path())
        .with_env_vars(HashMap::new())
        .build()
        .await
        .unwrap();

    assert!(sources
        .layers
        .iter()
        .all(|l| l.kind != SourceKind::EnvironmentFile));
    let bound = SettingsBinder::new().bind(&sources.merged());
    assert_eq!(bound.settings.environment, "Base");
}

#[cfg(feature = "vault")]
mod token {
    use async_trait::async_trait;
    use funcapp_settings::error::VaultError;
    use funcapp_settings::sources::TokenCredential;
    use reqwest::Client;

    pub struct StaticToken;

    #[async_trait]
    impl TokenCredential for StaticToken {
        async fn get_token(&self, _client: &Client) -> Result<String, VaultError> {
            Ok("test-token".to_string())
        }

        fn name(&self) -> &'static str {
            "static"
        }
    }
}

/// `Database:CommandTimeout` as set by each layer, if at all.
#[derive(Debug, Clone)]
struct TimeoutLayers {
    development: bool,
    base: Option<u16>,
    env_file: Option<u16>,
    secrets: Option<u16>,
    env_var: Option<u16>,
    vault: Option<u16>,
}

impl TimeoutLayers {
    fn expected(&self) -> i32 {
        let (secrets, vault) = if self.development {
            (self.secrets, None)
        } else {
            (None, self.vault)
        };
        vault
            .or(self.env_var)
            .or(secrets)
            .or(self.env_file)
            .or(self.base)
            .map_or(30, i32::from)
    }
}

fn timeout_json(v: u16) -> String {
    format!(r#"{{ "AppSettings": {{ "Database": {{ "CommandTimeout": {v} }} }} }}"#)
}

#[cfg(feature = "vault")]
fn vault_server(value: u16) -> (mockito::ServerGuard, Vec<mockito::Mock>) {
    let mut server = mockito::Server::new();
    let base = server.url();
    let list = server
        .mock("GET", "/secrets")
        .match_query(mockito::Matcher::Any)
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(format!(
            r#"{{"value":[{{"id":"{base}/secrets/AppSettings--Database--CommandTimeout"}}]}}"#
        ))
        .create();
    let secret = server
        .mock("GET", "/secrets/AppSettings--Database--CommandTimeout")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"value":"{value}"}}"#))
        .create();
    (server, vec![list, secret])
}

fn resolve_timeout(layers: &TimeoutLayers) -> i32 {
    let environment = if layers.development { "Development" } else { "Test" };
    let temp_dir = TempDir::new().unwrap();
    if let Some(v) = layers.base {
        write(temp_dir.path(), "appsettings.json", &timeout_json(v));
    }
    if let Some(v) = layers.env_file {
        write(
            temp_dir.path(),
            &format!("appsettings.{environment}.json"),
            &timeout_json(v),
        );
    }
    let secrets = temp_dir.path().join("secrets.json");
    if let Some(v) = layers.secrets {
        fs::write(&secrets, timeout_json(v)).unwrap();
    }
    let mut env = HashMap::new();
    if let Some(v) = layers.env_var {
        env.insert("AppSettings__Database__CommandTimeout".to_string(), v.to_string());
    }

    #[cfg(feature = "vault")]
    let _vault = layers.vault.map(|v| {
        let (server, mocks) = vault_server(v);
        env.insert("KeyVault__Url".to_string(), server.url());
        (server, mocks)
    });

    let builder = LayeredSourceBuilder::new(environment)
        .with_config_dir(temp_dir.path())
        .with_local_secrets(&secrets)
        .with_env_vars(env);
    #[cfg(feature = "vault")]
    let builder = builder.with_credential(std::sync::Arc::new(token::StaticToken));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let sources = runtime.block_on(builder.build()).unwrap();
    assert!(!sources.vault.is_failure(), "vault step failed: {:?}", sources.vault);

    SettingsBinder::new()
        .bind(&sources.merged())
        .settings
        .database
        .command_timeout
}

fn vault_value() -> BoxedStrategy<Option<u16>> {
    #[cfg(feature = "vault")]
    {
        proptest::option::of(1u16..1000).boxed()
    }
    #[cfg(not(feature = "vault"))]
    {
        Just(None).boxed()
    }
}

fn timeout_layers() -> impl Strategy<Value = TimeoutLayers> {
    (
        any::<bool>(),
        proptest::option::of(1u16..1000),
        proptest::option::of(1u16..1000),
        proptest::option::of(1u16..1000),
        proptest::option::of(1u16..1000),
        vault_value(),
    )
        .prop_map(|(development, base, env_file, secrets, env_var, vault)| TimeoutLayers {
            development,
            base,
            env_file,
            secrets,
            env_var,
            vault,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_last_definition_wins(layers in timeout_layers()) {
        prop_assert_eq!(resolve_timeout(&layers), layers.expected());
    }
}
