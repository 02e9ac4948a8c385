//! Health check and API document.

mod common;

use axum::http::StatusCode;
use common::{RecordingMailer, TestApp};

#[tokio::test]
async fn test_health_check_returns_200() {
    // Arrange
    let app = TestApp::spawn();

    // Act
    let (status, body) = app.get("/health", None).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "registry-service");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::spawn();

    let (status, body) = app.get("/api/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/2.0/auth/session").is_some());
    assert!(body["components"]["securitySchemes"]
        .get("bearer_auth")
        .is_some());
}

#[tokio::test]
async fn test_routes_follow_the_base_path() {
    let app = TestApp::with_vars(&[("HTTP_BASE_PATH", "/registry/")], RecordingMailer::default());

    let (status, _) = app.get("/registry/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/registry/api/2.0/permissions", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
