use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Application;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    #[schema(example = "app.example.org")]
    pub url: String,
    pub auth_token: String,
    pub permissions: Vec<String>,
    pub klinks: Vec<String>,
    pub active: bool,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        Self {
            id: app.id,
            owner_id: app.owner_id,
            name: app.name,
            url: app.url,
            auth_token: app.auth_token,
            permissions: app.permissions,
            klinks: app.klinks,
            active: app.active,
        }
    }
}

/// Body of create and update. `owner_id` defaults to the caller on create and
/// to the current owner on update; an omitted `auth_token` is generated on
/// create and kept on update.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApplicationRequest {
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub url: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub klinks: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
