use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{ChangePasswordRequest, PasswordResetRequest},
        EmptyResponse,
    },
    utils::{ApiPath, ValidatedJson},
    AppState,
};

/// Request a password reset link
///
/// Answers `{}` whether or not the address belongs to an account.
#[utoipa::path(
    post,
    path = "/api/2.0/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Request accepted", body = EmptyResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Email could not be sent", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<EmptyResponse>, AppError> {
    state.auth_service.request_password_reset(req).await?;
    Ok(Json(EmptyResponse::default()))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/2.0/auth/change-password/{token}",
    params(("token" = String, Path, description = "Password reset token")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = EmptyResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Unknown token", body = ErrorResponse),
        (status = 410, description = "Token has expired", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn change_password(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<EmptyResponse>, AppError> {
    state
        .auth_service
        .confirm_password_reset(&token, req)
        .await?;
    Ok(Json(EmptyResponse::default()))
}
