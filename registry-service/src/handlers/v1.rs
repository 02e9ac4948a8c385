//! v1 application authentication.
//!
//! JSON-RPC style: every outcome is HTTP 200 and failures are reported in the
//! envelope. Denials carry no detail for the caller.

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;

use crate::{
    dtos::v1::{AuthenticateParams, AuthenticateResult, RpcError, RpcRequest, RpcResponse},
    services::acl,
    AppState,
};

pub async fn authenticate_application(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<RpcResponse<AuthenticateResult>> {
    let request: RpcRequest<AuthenticateParams> = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected v1 request body");
            return Json(RpcResponse::failure(Value::Null, RpcError::INVALID_JSON));
        }
    };

    let RpcRequest { id, params } = request;
    if params.app_url.is_empty() || params.app_secret.is_empty() {
        return Json(RpcResponse::failure(id, RpcError::INVALID_REQUEST));
    }

    match acl::authenticate_application(
        state.store.as_ref(),
        &params.app_url,
        &params.app_secret,
        &params.permissions,
    )
    .await
    {
        Ok(authenticated) => {
            tracing::info!(
                application_id = %authenticated.application.id,
                app_url = %params.app_url,
                "Application authenticated"
            );
            Json(RpcResponse::success(id, authenticated.into()))
        }
        Err(e) => {
            tracing::warn!(error = %e, app_url = %params.app_url, "Application authentication denied");
            Json(RpcResponse::failure(id, RpcError::PERMISSION_DENIED))
        }
    }
}
