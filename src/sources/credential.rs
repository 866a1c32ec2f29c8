//! Ambient credentials for the secret vault.
//!
//! Resolution order mirrors the usual Azure chain: a service principal from
//! environment variables, then the App Service / Functions managed identity
//! endpoint, then the instance metadata service.

use crate::error::VaultError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

const REDACTED: &str = "<redacted>";

/// Resource the vault tokens are issued for.
pub const VAULT_RESOURCE: &str = "https://vault.azure.net";

/// OAuth scope for the client-credentials flow.
pub const VAULT_SCOPE: &str = "https://vault.azure.net/.default";

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const IMDS_API_VERSION: &str = "2018-02-01";

/// Something that can produce a bearer token for the vault.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Acquire an access token.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::CredentialUnavailable`] when the credential cannot
    /// be used in this environment, or [`VaultError::Authentication`] when the
    /// token request was rejected.
    async fn get_token(&self, client: &Client) -> Result<String, VaultError>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// Snapshot of the environment variables credentials are resolved from.
#[derive(Clone, Default)]
pub struct AmbientEnvironment {
    vars: HashMap<String, String>,
}

// Values can hold the client secret; only names are printed.
impl fmt::Debug for AmbientEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("AmbientEnvironment")
            .field("vars", &keys)
            .finish()
    }
}

impl AmbientEnvironment {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: super::env::process_vars(),
        }
    }

    /// Use explicit variables.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Credential selected from the ambient environment.
///
/// `Debug` prints the client secret and identity header as `<redacted>`.
#[derive(Clone, PartialEq, Eq)]
pub enum AmbientCredential {
    /// Service principal with a client secret.
    ClientSecret {
        /// Token authority, e.g. `https://login.microsoftonline.com`
        authority_host: String,
        /// Directory (tenant) id
        tenant_id: String,
        /// Application (client) id
        client_id: String,
        /// Client secret
        client_secret: String,
    },
    /// Managed identity exposed by App Service and Functions.
    AppServiceIdentity {
        /// Local token endpoint
        endpoint: String,
        /// Per-instance header value
        header: String,
        /// User-assigned identity, if any
        client_id: Option<String>,
    },
    /// Managed identity through the instance metadata service.
    Imds {
        /// Metadata token endpoint
        endpoint: String,
        /// User-assigned identity, if any
        client_id: Option<String>,
    },
}

impl fmt::Debug for AmbientCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientSecret {
                authority_host,
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("authority_host", authority_host)
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &REDACTED)
                .finish(),
            Self::AppServiceIdentity {
                endpoint,
                client_id,
                ..
            } => f
                .debug_struct("AppServiceIdentity")
                .field("endpoint", endpoint)
                .field("header", &REDACTED)
                .field("client_id", client_id)
                .finish(),
            Self::Imds {
                endpoint,
                client_id,
            } => f
                .debug_struct("Imds")
                .field("endpoint", endpoint)
                .field("client_id", client_id)
                .finish(),
        }
    }
}

impl AmbientCredential {
    /// Pick the first credential whose prerequisites are present.
    pub fn resolve(env: &AmbientEnvironment) -> Self {
        let client_id = env.get("AZURE_CLIENT_ID").map(str::to_string);

        if let (Some(tenant_id), Some(id), Some(secret)) = (
            env.get("AZURE_TENANT_ID"),
            client_id.as_deref(),
            env.get("AZURE_CLIENT_SECRET"),
        ) {
            return Self::ClientSecret {
                authority_host: env
                    .get("AZURE_AUTHORITY_HOST")
                    .unwrap_or(DEFAULT_AUTHORITY_HOST)
                    .trim_end_matches('/')
                    .to_string(),
                tenant_id: tenant_id.to_string(),
                client_id: id.to_string(),
                client_secret: secret.to_string(),
            };
        }

        if let (Some(endpoint), Some(header)) =
            (env.get("IDENTITY_ENDPOINT"), env.get("IDENTITY_HEADER"))
        {
            return Self::AppServiceIdentity {
                endpoint: endpoint.to_string(),
                header: header.to_string(),
                client_id,
            };
        }

        Self::Imds {
            endpoint: IMDS_ENDPOINT.to_string(),
            client_id,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

async fn read_token(response: reqwest::Response) -> Result<String, VaultError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VaultError::Authentication(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }
    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| VaultError::Authentication(format!("malformed token response: {}", e)))?;
    Ok(token.access_token)
}

#[async_trait]
impl TokenCredential for AmbientCredential {
    async fn get_token(&self, client: &Client) -> Result<String, VaultError> {
        match self {
            Self::ClientSecret {
                authority_host,
                tenant_id,
                client_id,
                client_secret,
            } => {
                let url = format!("{}/{}/oauth2/v2.0/token", authority_host, tenant_id);
                let response = client
                    .post(&url)
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("scope", VAULT_SCOPE),
                    ])
                    .send()
                    .await
                    .map_err(|e| VaultError::Authentication(format!("token request failed: {}", e)))?;
                read_token(response).await
            }
            Self::AppServiceIdentity {
                endpoint,
                header,
                client_id,
            } => {
                let mut query = vec![
                    ("api-version", APP_SERVICE_API_VERSION),
                    ("resource", VAULT_RESOURCE),
                ];
                if let Some(id) = client_id {
                    query.push(("client_id", id.as_str()));
                }
                let response = client
                    .get(endpoint)
                    .query(&query)
                    .header("X-IDENTITY-HEADER", header)
                    .send()
                    .await
                    .map_err(|e| VaultError::Authentication(format!("token request failed: {}", e)))?;
                read_token(response).await
            }
            Self::Imds {
                endpoint,
                client_id,
            } => {
                let mut query = vec![
                    ("api-version", IMDS_API_VERSION),
                    ("resource", VAULT_RESOURCE),
                ];
                if let Some(id) = client_id {
                    query.push(("client_id", id.as_str()));
                }
                // Off Azure there is no metadata service; that means "no credential".
                let response = client
                    .get(endpoint)
                    .query(&query)
                    .header("Metadata", "true")
                    .send()
                    .await
                    .map_err(|e| {
                        VaultError::CredentialUnavailable(format!(
                            "managed identity endpoint not reachable: {}",
                            e
                        ))
                    })?;
                read_token(response).await
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ClientSecret { .. } => "client-secret",
            Self::AppServiceIdentity { .. } => "app-service-identity",
            Self::Imds { .. } => "imds",
        }
    }
}
