use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        klink::{KlinkRequest, KlinkResponse},
        EmptyResponse,
    },
    middleware::CurrentUser,
    models::Klink,
    services::{access, ServiceError},
    utils::{ApiPath, ValidatedJson},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/2.0/klinks",
    responses(
        (status = 200, description = "All K-Links", body = [KlinkResponse]),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "K-Links",
    security(("bearer_auth" = []))
)]
pub async fn list_klinks(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<KlinkResponse>>, AppError> {
    if !access::can_read_klinks(&actor) {
        return Err(ServiceError::Forbidden.into());
    }
    let klinks = state.store.list_klinks().await?;
    Ok(Json(klinks.into_iter().map(KlinkResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/2.0/klinks/{id}",
    params(("id" = i64, Path, description = "K-Link id")),
    responses(
        (status = 200, description = "K-Link", body = KlinkResponse),
        (status = 404, description = "Unknown K-Link", body = ErrorResponse)
    ),
    tag = "K-Links",
    security(("bearer_auth" = []))
)]
pub async fn get_klink(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<KlinkResponse>, AppError> {
    if !access::can_read_klinks(&actor) {
        return Err(ServiceError::Forbidden.into());
    }
    Ok(Json(load(&state, id).await?.into()))
}

/// Add a K-Link (ADMIN and OWNER only)
#[utoipa::path(
    post,
    path = "/api/2.0/klinks",
    request_body = KlinkRequest,
    responses(
        (status = 200, description = "K-Link created", body = KlinkResponse),
        (status = 400, description = "Unknown manager", body = ErrorResponse),
        (status = 403, description = "Caller may not manage K-Links", body = ErrorResponse),
        (status = 409, description = "Identifier already in use", body = ErrorResponse)
    ),
    tag = "K-Links",
    security(("bearer_auth" = []))
)]
pub async fn create_klink(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<KlinkRequest>,
) -> Result<Json<KlinkResponse>, AppError> {
    if !access::can_manage_klinks(&actor) {
        return Err(ServiceError::Forbidden.into());
    }

    let manager_id = req.manager_id.unwrap_or(actor.id);
    check_manager(&state, manager_id).await?;

    let klink = state
        .store
        .create_klink(Klink {
            id: 0,
            identifier: req.identifier,
            manager_id,
            name: req.name,
            website: req.website,
            description: req.description,
            active: req.active,
        })
        .await?;

    tracing::info!(klink_id = %klink.id, identifier = %klink.identifier, "K-Link created");
    Ok(Json(klink.into()))
}

/// Update a K-Link
///
/// The node's manager may edit it; reassigning the manager stays with ADMIN
/// and OWNER.
#[utoipa::path(
    put,
    path = "/api/2.0/klinks/{id}",
    params(("id" = i64, Path, description = "K-Link id")),
    request_body = KlinkRequest,
    responses(
        (status = 200, description = "K-Link updated", body = KlinkResponse),
        (status = 400, description = "Unknown manager", body = ErrorResponse),
        (status = 403, description = "Caller may not update this K-Link", body = ErrorResponse),
        (status = 404, description = "Unknown K-Link", body = ErrorResponse),
        (status = 409, description = "Identifier already in use", body = ErrorResponse)
    ),
    tag = "K-Links",
    security(("bearer_auth" = []))
)]
pub async fn update_klink(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<KlinkRequest>,
) -> Result<Json<KlinkResponse>, AppError> {
    let mut klink = load(&state, id).await?;
    if !access::can_update_klink(&actor, &klink) {
        return Err(ServiceError::Forbidden.into());
    }

    if let Some(manager_id) = req.manager_id {
        if manager_id != klink.manager_id {
            if !access::can_manage_klinks(&actor) {
                return Err(ServiceError::Forbidden.into());
            }
            check_manager(&state, manager_id).await?;
            klink.manager_id = manager_id;
        }
    }

    klink.identifier = req.identifier;
    klink.name = req.name;
    klink.website = req.website;
    klink.description = req.description;
    klink.active = req.active;

    state.store.replace_klink(&klink).await?;

    tracing::info!(klink_id = %klink.id, updated_by = %actor.id, "K-Link updated");
    Ok(Json(klink.into()))
}

#[utoipa::path(
    delete,
    path = "/api/2.0/klinks/{id}",
    params(("id" = i64, Path, description = "K-Link id")),
    responses(
        (status = 200, description = "K-Link deleted", body = EmptyResponse),
        (status = 403, description = "Caller may not manage K-Links", body = ErrorResponse),
        (status = 404, description = "Unknown K-Link", body = ErrorResponse)
    ),
    tag = "K-Links",
    security(("bearer_auth" = []))
)]
pub async fn delete_klink(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<EmptyResponse>, AppError> {
    if !access::can_manage_klinks(&actor) {
        return Err(ServiceError::Forbidden.into());
    }
    state.store.delete_klink(id).await?;

    tracing::info!(klink_id = %id, deleted_by = %actor.id, "K-Link deleted");
    Ok(Json(EmptyResponse::default()))
}

async fn load(state: &AppState, id: i64) -> Result<Klink, AppError> {
    state
        .store
        .get_klink_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound.into())
}

async fn check_manager(state: &AppState, manager_id: i64) -> Result<(), AppError> {
    match state.store.get_registrant_by_id(manager_id).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::Validation(format!("Unknown manager: {}", manager_id)).into()),
    }
}
