use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{ConfirmEmailRequest, EmailVerificationResponse, RegistrationRequest},
        EmptyResponse,
    },
    utils::{ApiPath, ValidatedJson},
    AppState,
};

/// Register a new account
///
/// The account stays inactive and without password until the emailed link is
/// confirmed.
#[utoipa::path(
    post,
    path = "/api/2.0/auth/registrations",
    request_body = RegistrationRequest,
    responses(
        (status = 200, description = "Verification email sent", body = EmptyResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email taken or registration disabled", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Email could not be sent", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegistrationRequest>,
) -> Result<Json<EmptyResponse>, AppError> {
    state.auth_service.register(req).await?;
    Ok(Json(EmptyResponse::default()))
}

/// Describe a pending email verification
#[utoipa::path(
    get,
    path = "/api/2.0/auth/email-verification/{token}",
    params(("token" = String, Path, description = "Verification token")),
    responses(
        (status = 200, description = "Token is valid", body = EmailVerificationResponse),
        (status = 404, description = "Unknown token", body = ErrorResponse),
        (status = 410, description = "Token has expired", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn inspect_email_verification(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<EmailVerificationResponse>, AppError> {
    let res = state.auth_service.inspect_email_verification(&token).await?;
    Ok(Json(res))
}

/// Confirm an email address
#[utoipa::path(
    post,
    path = "/api/2.0/auth/email-verification/{token}",
    params(("token" = String, Path, description = "Verification token")),
    request_body = ConfirmEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = EmptyResponse),
        (status = 400, description = "A password is required", body = ErrorResponse),
        (status = 404, description = "Unknown token", body = ErrorResponse),
        (status = 410, description = "Token has expired", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn confirm_email_verification(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<ConfirmEmailRequest>,
) -> Result<Json<EmptyResponse>, AppError> {
    state
        .auth_service
        .confirm_email_verification(&token, req)
        .await?;
    Ok(Json(EmptyResponse::default()))
}
