use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{LoginRequest, SessionResponse},
    middleware::CurrentUser,
    utils::ValidatedJson,
    AppState,
};

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/2.0/auth/session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 403, description = "Invalid credentials or disabled account", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.auth_service.login(req).await?;
    Ok(Json(session))
}

/// Exchange the current session for a longer one
#[utoipa::path(
    get,
    path = "/api/2.0/auth/session",
    responses(
        (status = 200, description = "Session refreshed", body = SessionResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 403, description = "Account disabled", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn refresh(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.auth_service.refresh(&identity).await?;
    Ok(Json(session))
}
