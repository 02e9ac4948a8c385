//! JSON-RPC style envelopes of the v1 API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::acl::AuthenticatedApplication;

#[derive(Debug, Deserialize)]
pub struct RpcRequest<P> {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub params: P,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthenticateParams {
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub app_url: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Always sent with HTTP 200; failures only show up in `error`.
#[derive(Debug, Serialize)]
pub struct RpcResponse<R> {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl<R> RpcResponse<R> {
    pub fn success(id: Value, result: R) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: &'static str,
}

impl RpcError {
    pub const INVALID_JSON: RpcError = RpcError {
        code: -32700,
        message: "Invalid JSON object.",
    };
    pub const INVALID_REQUEST: RpcError = RpcError {
        code: -32602,
        message: "Invalid request.",
    };
    pub const PERMISSION_DENIED: RpcError = RpcError {
        code: -32000,
        message: "Permission Denied.",
    };
}

#[derive(Debug, Serialize)]
pub struct KlinkRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateResult {
    pub name: String,
    pub app_url: String,
    pub app_id: i64,
    pub permissions: Vec<String>,
    pub klinks: Vec<KlinkRef>,
    pub email: String,
}

impl From<AuthenticatedApplication> for AuthenticateResult {
    fn from(authenticated: AuthenticatedApplication) -> Self {
        let app = authenticated.application;
        Self {
            name: app.name,
            app_url: app.url,
            app_id: app.id,
            permissions: app.permissions,
            klinks: authenticated
                .klinks
                .into_iter()
                .map(|k| KlinkRef {
                    id: k.identifier,
                    name: k.name,
                })
                .collect(),
            email: authenticated.owner_email,
        }
    }
}
