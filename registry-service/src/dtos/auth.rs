use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Role;

/// Missing fields are treated as empty so they fail as bad credentials.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: i64,
    #[schema(value_type = String, example = "ROLE_USER")]
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegistrationRequest {
    #[validate(email)]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Jane Doe")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmailVerificationResponse {
    /// True when the registrant has no password yet and must set one.
    pub require_password: bool,
    pub display_name: String,
}

/// Password is only used when the registrant has none yet.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ConfirmEmailRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub password: String,
}
