//! Registrant administration.
//!
//! Every rule is taken from [`crate::services::access`]: reads and lists are
//! filtered per row, updates are narrowed to the caller's scope.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        registrant::{CreateRegistrantRequest, RegistrantResponse, UpdateRegistrantRequest},
        EmptyResponse,
    },
    middleware::CurrentUser,
    models::{Registrant, Role},
    services::{
        access::{self, UpdateScope},
        ServiceError, StoreError,
    },
    utils::{hash_password, ApiPath, Password, ValidatedJson},
    AppState,
};

fn duplicate_as_taken(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate(_) => ServiceError::DuplicateRegistrant.into(),
        other => other.into(),
    }
}

/// List the registrants visible to the caller
#[utoipa::path(
    get,
    path = "/api/2.0/registrants",
    responses(
        (status = 200, description = "Visible registrants", body = [RegistrantResponse]),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "Registrants",
    security(("bearer_auth" = []))
)]
pub async fn list_registrants(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<RegistrantResponse>>, AppError> {
    let registrants = state.store.list_registrants().await?;
    Ok(Json(
        registrants
            .into_iter()
            .filter(|r| access::can_read_registrant(&actor, r))
            .map(RegistrantResponse::from)
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/2.0/registrants/{id}",
    params(("id" = i64, Path, description = "Registrant id")),
    responses(
        (status = 200, description = "Registrant", body = RegistrantResponse),
        (status = 403, description = "Not visible to the caller", body = ErrorResponse),
        (status = 404, description = "Unknown registrant", body = ErrorResponse)
    ),
    tag = "Registrants",
    security(("bearer_auth" = []))
)]
pub async fn get_registrant(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<RegistrantResponse>, AppError> {
    let registrant = load(&state, id).await?;
    if !access::can_read_registrant(&actor, &registrant) {
        return Err(ServiceError::Forbidden.into());
    }
    Ok(Json(registrant.into()))
}

/// Create an account on someone's behalf (ADMIN and OWNER only)
#[utoipa::path(
    post,
    path = "/api/2.0/registrants",
    request_body = CreateRegistrantRequest,
    responses(
        (status = 200, description = "Registrant created", body = RegistrantResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller may not create this registrant", body = ErrorResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse)
    ),
    tag = "Registrants",
    security(("bearer_auth" = []))
)]
pub async fn create_registrant(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateRegistrantRequest>,
) -> Result<Json<RegistrantResponse>, AppError> {
    let role = req.role.unwrap_or(Role::User);
    if !access::can_create_registrant(&actor) || !access::can_assign_role(&actor, role) {
        return Err(ServiceError::Forbidden.into());
    }

    let password_hash = match req.password.filter(|p| !p.is_empty()) {
        Some(password) => hash_password(&Password::new(password))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?
            .into_string(),
        None => String::new(),
    };

    let registrant = state
        .store
        .create_registrant(Registrant {
            id: 0,
            email: req.email,
            password_hash,
            name: req.name,
            role,
            active: req.active,
            last_login: 0,
        })
        .await
        .map_err(duplicate_as_taken)?;

    tracing::info!(
        registrant_id = %registrant.id,
        created_by = %actor.id,
        role = %registrant.role,
        "Registrant created"
    );
    Ok(Json(registrant.into()))
}

/// Update a registrant
///
/// Role and active flag are only applied when the caller has full scope over
/// the target; otherwise they are ignored.
#[utoipa::path(
    put,
    path = "/api/2.0/registrants/{id}",
    params(("id" = i64, Path, description = "Registrant id")),
    request_body = UpdateRegistrantRequest,
    responses(
        (status = 200, description = "Registrant updated", body = RegistrantResponse),
        (status = 403, description = "Caller may not update this registrant", body = ErrorResponse),
        (status = 404, description = "Unknown registrant", body = ErrorResponse),
        (status = 409, description = "Email already taken", body = ErrorResponse)
    ),
    tag = "Registrants",
    security(("bearer_auth" = []))
)]
pub async fn update_registrant(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateRegistrantRequest>,
) -> Result<Json<RegistrantResponse>, AppError> {
    let mut registrant = load(&state, id).await?;

    let scope = access::registrant_update_scope(&actor, &registrant)
        .ok_or(ServiceError::Forbidden)?;

    registrant.email = req.email;
    registrant.name = req.name;

    if scope == UpdateScope::Full {
        if let Some(role) = req.role {
            if role != registrant.role && !access::can_assign_role(&actor, role) {
                return Err(ServiceError::Forbidden.into());
            }
            registrant.role = role;
        }
        if let Some(active) = req.active {
            registrant.active = active;
        }
    }

    state
        .store
        .replace_registrant(&registrant)
        .await
        .map_err(duplicate_as_taken)?;

    tracing::info!(registrant_id = %registrant.id, updated_by = %actor.id, "Registrant updated");
    Ok(Json(registrant.into()))
}

/// Delete a registrant
///
/// Deleting an id that does not exist succeeds.
#[utoipa::path(
    delete,
    path = "/api/2.0/registrants/{id}",
    params(("id" = i64, Path, description = "Registrant id")),
    responses(
        (status = 200, description = "Registrant deleted", body = EmptyResponse),
        (status = 403, description = "Caller may not delete this registrant", body = ErrorResponse),
        (status = 409, description = "Registrant still manages a K-Link", body = ErrorResponse)
    ),
    tag = "Registrants",
    security(("bearer_auth" = []))
)]
pub async fn delete_registrant(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<EmptyResponse>, AppError> {
    let Some(registrant) = state.store.get_registrant_by_id(id).await? else {
        return Ok(Json(EmptyResponse::default()));
    };

    if !access::can_delete_registrant(&actor, &registrant) {
        return Err(ServiceError::Forbidden.into());
    }

    match state.store.delete_registrant(id).await {
        Ok(()) | Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!(registrant_id = %id, deleted_by = %actor.id, "Registrant deleted");
    Ok(Json(EmptyResponse::default()))
}

async fn load(state: &AppState, id: i64) -> Result<Registrant, AppError> {
    state
        .store
        .get_registrant_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound.into())
}
