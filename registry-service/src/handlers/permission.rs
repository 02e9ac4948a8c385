use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::permission::CreatePermissionRequest,
    middleware::CurrentUser,
    models::Permission,
    services::{access, ServiceError},
    utils::ValidatedJson,
    AppState,
};

/// List the permissions applications can be granted
#[utoipa::path(
    get,
    path = "/api/2.0/permissions",
    responses(
        (status = 200, description = "Known permissions", body = [Permission])
    ),
    tag = "Permissions"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Permission>>, AppError> {
    Ok(Json(state.store.list_permissions().await?))
}

#[utoipa::path(
    post,
    path = "/api/2.0/permissions",
    request_body = CreatePermissionRequest,
    responses(
        (status = 200, description = "Permission created", body = Permission),
        (status = 403, description = "Caller may not manage permissions", body = ErrorResponse),
        (status = 409, description = "Permission already exists", body = ErrorResponse)
    ),
    tag = "Permissions",
    security(("bearer_auth" = []))
)]
pub async fn create_permission(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreatePermissionRequest>,
) -> Result<Json<Permission>, AppError> {
    if !access::can_manage_permissions(&actor) {
        return Err(ServiceError::Forbidden.into());
    }

    let permission = Permission { name: req.name };
    state.store.create_permission(&permission).await?;

    tracing::info!(permission = %permission.name, created_by = %actor.id, "Permission created");
    Ok(Json(permission))
}
