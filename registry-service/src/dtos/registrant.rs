use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Registrant, Role};

/// Registrant as exposed by the API; the password hash never leaves the store.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrantResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[schema(value_type = String, example = "ROLE_USER")]
    pub role: Role,
    pub active: bool,
    pub last_login: i64,
}

impl From<Registrant> for RegistrantResponse {
    fn from(registrant: Registrant) -> Self {
        Self {
            id: registrant.id,
            email: registrant.email,
            name: registrant.name,
            role: registrant.role,
            active: registrant.active,
            last_login: registrant.last_login,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRegistrantRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "ROLE_USER")]
    pub role: Option<Role>,
    #[serde(default)]
    pub active: bool,
    /// Without a password the account can only log in after a password reset.
    #[serde(default)]
    pub password: Option<String>,
}

/// Role and active flag are ignored unless the caller may change them.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRegistrantRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "ROLE_ADMIN")]
    pub role: Option<Role>,
    #[serde(default)]
    pub active: Option<bool>,
}
