//! Integration tests for the HTTP routes.

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use funcapp_settings::core::{AppSettings, ResolvedSettings, VaultOutcome, VaultSkipReason};
use funcapp_settings::error::VaultError;
use funcapp_settings::http::{AppState, router};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const API_KEY: &str = "sk-live-abcdef123456";
const JWT_SECRET: &str = "jwt-signing-secret-xyz";

fn state(vault: VaultOutcome) -> AppState {
    let mut settings = AppSettings::default();
    settings.environment = "Production".into();
    settings.application_insights_connection_string = Some("InstrumentationKey=abc".into());
    settings.database.connection_string = "Server=db;Password=p@ss".into();
    settings.external_api.base_url = "https://api.example.com".into();
    settings.external_api.api_key = API_KEY.into();
    settings.security.jwt_secret = JWT_SECRET.into();
    settings.security.allowed_origins = vec!["https://app.example.com".into()];

    AppState::new(ResolvedSettings {
        settings: Arc::new(settings),
        environment: "Production".into(),
        sources: vec!["env:*".into()],
        vault,
    })
}

fn healthy() -> AppState {
    state(VaultOutcome::Skipped(VaultSkipReason::NotConfigured))
}

async fn call(state: AppState, method: Method, uri: &str) -> (StatusCode, String) {
    let response = router(state)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_config_endpoint_is_redacted() {
    let (status, body) = call(healthy(), Method::GET, "/api/config").await;
    assert_eq!(status, StatusCode::OK);

    assert!(!body.contains(API_KEY));
    assert!(!body.contains(JWT_SECRET));
    assert!(!body.contains("p@ss"));
    assert!(!body.contains("InstrumentationKey"));

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["environment"], "Production");
    assert_eq!(json["hasApplicationInsightsConnectionString"], true);
    assert_eq!(json["database"]["hasConnectionString"], true);
    assert_eq!(json["externalApi"]["hasApiKey"], true);
    assert_eq!(json["externalApi"]["baseUrl"], "https://api.example.com");
    assert_eq!(json["security"]["hasJwtSecret"], true);
    assert_eq!(json["security"]["tokenExpirationMinutes"], 60);
}

#[tokio::test]
async fn test_health_get_and_post() {
    for method in [Method::GET, Method::POST] {
        let (status, body) = call(healthy(), method, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "\"Healthy\"");
    }
}

#[tokio::test]
async fn test_health_degraded_without_vault() {
    let state = state(VaultOutcome::Failed(VaultError::Unreachable(
        "connection refused".into(),
    )));
    let (_, body) = call(state, Method::GET, "/api/health").await;
    assert_eq!(body, "\"Degraded\"");
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    for uri in ["/", "/api"] {
        let (status, body) = call(healthy(), Method::GET, uri).await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["endpoints"]["config"], "/api/config");
        assert_eq!(json["endpoints"]["health"], "/api/health");
        assert!(json["timestamp"].is_string());
        assert!(json["message"].is_string());
    }
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method() {
    let (status, _) = call(healthy(), Method::GET, "/api/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(healthy(), Method::POST, "/api/config").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
