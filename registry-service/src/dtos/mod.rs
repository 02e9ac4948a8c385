pub mod application;
pub mod auth;
pub mod klink;
pub mod permission;
pub mod registrant;
pub mod v1;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body of the v2 API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid Credentials")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// `{}`, for calls that return no data.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EmptyResponse {}
