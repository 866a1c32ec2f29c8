//! Azure Key Vault configuration source.

use super::credential::TokenCredential;
use super::{ConfigSource, SourceKind};
use crate::core::{KEY_DELIMITER, RawConfigMap};
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// REST API version used for secret reads.
pub const API_VERSION: &str = "7.4";

/// Key Vault names cannot contain ':'; this stands in for it.
pub const NAME_DELIMITER: &str = "--";

/// Map a secret name to a configuration key (`A--B--C` -> `a:b:c`).
pub fn secret_name_to_key(name: &str) -> String {
    RawConfigMap::normalize_key(&name.replace(NAME_DELIMITER, KEY_DELIMITER))
}

#[derive(Deserialize)]
struct SecretListPage {
    #[serde(default)]
    value: Vec<SecretItem>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Deserialize)]
struct SecretItem {
    id: String,
    #[serde(default)]
    attributes: SecretAttributes,
}

#[derive(Deserialize)]
struct SecretAttributes {
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

impl Default for SecretAttributes {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Deserialize)]
struct SecretBundle {
    value: String,
}

/// Reads every enabled secret from a vault.
///
/// The whole fetch, token acquisition included, is bounded by the configured
/// timeout; exceeding it yields [`VaultError::Timeout`].
///
/// # Examples
///
/// ```rust,no_run
/// use funcapp_settings::sources::{AmbientCredential, AmbientEnvironment, KeyVaultSource};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), funcapp_settings::error::VaultError> {
/// let credential = AmbientCredential::resolve(&AmbientEnvironment::from_process());
/// let source = KeyVaultSource::new(
///     "https://my-vault.vault.azure.net/",
///     Arc::new(credential),
///     Duration::from_secs(30),
/// )?;
/// # Ok(())
/// # }
/// ```
pub struct KeyVaultSource {
    vault_url: Url,
    client: Client,
    credential: Arc<dyn TokenCredential>,
    timeout: Duration,
    priority: i32,
}

impl KeyVaultSource {
    /// Create a source for the vault at `vault_url`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidUrl`] if the URL does not parse and
    /// [`VaultError::Unreachable`] if the HTTP client cannot be constructed.
    pub fn new(
        vault_url: &str,
        credential: Arc<dyn TokenCredential>,
        timeout: Duration,
    ) -> std::result::Result<Self, VaultError> {
        let trimmed = vault_url.trim();
        let with_slash = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };
        let vault_url =
            Url::parse(&with_slash).map_err(|_| VaultError::InvalidUrl(trimmed.to_string()))?;
        if !matches!(vault_url.scheme(), "http" | "https") {
            return Err(VaultError::InvalidUrl(trimmed.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VaultError::Unreachable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            vault_url,
            client,
            credential,
            timeout,
            priority: 400, // Highest: vault values win over everything
        })
    }

    /// Set the priority for this source.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Fetch all secrets, bounded by the timeout.
    ///
    /// # Errors
    ///
    /// Returns the [`VaultError`] describing why the vault could not be read.
    pub async fn fetch(&self) -> std::result::Result<RawConfigMap, VaultError> {
        tokio::time::timeout(self.timeout, self.fetch_all())
            .await
            .map_err(|_| VaultError::Timeout(self.timeout))?
    }

    async fn fetch_all(&self) -> std::result::Result<RawConfigMap, VaultError> {
        let token = self.credential.get_token(&self.client).await?;
        tracing::debug!(credential = self.credential.name(), "Acquired vault token");

        let mut map = RawConfigMap::new();
        let mut next = Some(self.endpoint("secrets")?);

        while let Some(page_url) = next.take() {
            let page: SecretListPage = self.get_json(page_url, &token).await?;

            for item in page.value {
                if !item.attributes.enabled {
                    continue;
                }
                let Some(name) = item.id.rsplit('/').find(|s| !s.is_empty()) else {
                    continue;
                };
                let secret_url = self.endpoint(&format!("secrets/{}", name))?;
                let bundle: SecretBundle = self.get_json(secret_url, &token).await?;
                map.insert(secret_name_to_key(name), bundle.value);
            }

            next = match page.next_link {
                Some(link) if !link.is_empty() => Some(self.next_page(&link)?),
                _ => None,
            };
        }

        Ok(map)
    }

    /// Parse a `nextLink`; it must stay on the vault's origin so the token
    /// is never sent elsewhere.
    fn next_page(&self, link: &str) -> std::result::Result<Url, VaultError> {
        let url = Url::parse(link)
            .map_err(|_| VaultError::InvalidResponse(format!("bad nextLink '{}'", link)))?;
        if url.origin() != self.vault_url.origin() {
            return Err(VaultError::InvalidResponse(format!(
                "nextLink '{}' leaves the vault origin",
                link
            )));
        }
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, VaultError> {
        let mut url = self
            .vault_url
            .join(path)
            .map_err(|_| VaultError::InvalidUrl(format!("{}{}", self.vault_url, path)))?;
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        token: &str,
    ) -> std::result::Result<T, VaultError> {
        let path = url.path().to_string();
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VaultError::Timeout(self.timeout)
                } else {
                    VaultError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::Status {
                status: status.as_u16(),
                path,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| VaultError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ConfigSource for KeyVaultSource {
    async fn load(&self) -> Result<RawConfigMap> {
        Ok(self.fetch().await?)
    }

    fn name(&self) -> String {
        format!("vault:{}", self.vault_url)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Vault
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
