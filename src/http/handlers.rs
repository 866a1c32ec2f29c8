//! Route handlers.

use crate::core::{ResolvedSettings, Validate, VaultOutcome};
use crate::http::redact::RedactedSettings;
use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Shared, read-only handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Settings that passed startup validation.
    pub resolved: Arc<ResolvedSettings>,
}

impl AppState {
    /// State over already validated settings.
    pub fn new(resolved: ResolvedSettings) -> Self {
        Self {
            resolved: Arc::new(resolved),
        }
    }
}

/// Overall health, serialized as its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// Everything resolved.
    Healthy,
    /// Running without vault secrets.
    Degraded,
    /// Settings no longer pass validation.
    Unhealthy,
}

impl HealthStatus {
    /// Assess the resolved settings.
    pub fn assess(resolved: &ResolvedSettings) -> Self {
        if resolved.settings.validate().is_err() {
            Self::Unhealthy
        } else if matches!(resolved.vault, VaultOutcome::Failed(_)) {
            Self::Degraded
        } else {
            Self::Healthy
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Endpoints {
    config: &'static str,
    health: &'static str,
}

/// Body of the root route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RootResponse {
    message: &'static str,
    timestamp: DateTime<Utc>,
    endpoints: Endpoints,
}

pub(crate) async fn root() -> Json<RootResponse> {
    tracing::info!("Root function processed a request");
    Json(RootResponse {
        message: "Azure Functions CI/CD Demo",
        timestamp: Utc::now(),
        endpoints: Endpoints {
            config: "/api/config",
            health: "/api/health",
        },
    })
}

pub(crate) async fn config(State(state): State<AppState>) -> Json<RedactedSettings> {
    tracing::info!(
        environment = %state.resolved.environment,
        "Configuration demo function processed a request"
    );
    Json(RedactedSettings::from(state.resolved.settings.as_ref()))
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let status = HealthStatus::assess(&state.resolved);
    tracing::debug!(?status, "Health check");
    Json(status)
}
