use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Klink;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KlinkResponse {
    pub id: i64,
    #[schema(example = "KLINK_TEST")]
    pub identifier: String,
    pub manager_id: i64,
    pub name: String,
    pub website: String,
    pub description: String,
    pub active: bool,
}

impl From<Klink> for KlinkResponse {
    fn from(klink: Klink) -> Self {
        Self {
            id: klink.id,
            identifier: klink.identifier,
            manager_id: klink.manager_id,
            name: klink.name,
            website: klink.website,
            description: klink.description,
            active: klink.active,
        }
    }
}

/// `manager_id` defaults to the caller on create and to the current manager
/// on update.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct KlinkRequest {
    #[validate(length(min = 1, max = 255))]
    pub identifier: String,
    #[serde(default)]
    pub manager_id: Option<i64>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
