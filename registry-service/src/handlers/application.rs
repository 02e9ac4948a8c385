use axum::{extract::State, Json};
use service_core::error::AppError;
use std::collections::HashSet;

use crate::{
    dtos::{
        application::{ApplicationRequest, ApplicationResponse},
        EmptyResponse,
    },
    middleware::CurrentUser,
    models::{Application, Identity},
    services::{access, ServiceError},
    utils::{generate_application_secret, ApiPath, ValidatedJson},
    AppState,
};

/// List the applications visible to the caller
#[utoipa::path(
    get,
    path = "/api/2.0/applications",
    responses(
        (status = 200, description = "Visible applications", body = [ApplicationResponse]),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "Applications",
    security(("bearer_auth" = []))
)]
pub async fn list_applications(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<ApplicationResponse>>, AppError> {
    let applications = state.store.list_applications().await?;
    Ok(Json(
        applications
            .into_iter()
            .filter(|a| access::can_access_application(&actor, a))
            .map(ApplicationResponse::from)
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/2.0/applications/{id}",
    params(("id" = i64, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 403, description = "Not visible to the caller", body = ErrorResponse),
        (status = 404, description = "Unknown application", body = ErrorResponse)
    ),
    tag = "Applications",
    security(("bearer_auth" = []))
)]
pub async fn get_application(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let application = load_for(&state, &actor, id).await?;
    Ok(Json(application.into()))
}

/// Register an application
///
/// A secret is generated when `auth_token` is omitted.
#[utoipa::path(
    post,
    path = "/api/2.0/applications",
    request_body = ApplicationRequest,
    responses(
        (status = 200, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "Unknown owner or permission", body = ErrorResponse),
        (status = 403, description = "Caller may not assign this owner", body = ErrorResponse),
        (status = 409, description = "URL already registered", body = ErrorResponse)
    ),
    tag = "Applications",
    security(("bearer_auth" = []))
)]
pub async fn create_application(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(req): ValidatedJson<ApplicationRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let owner_id = req.owner_id.unwrap_or(actor.id);
    if owner_id != actor.id && !access::can_reassign_application_owner(&actor) {
        return Err(ServiceError::Forbidden.into());
    }

    let candidate = Application {
        id: 0,
        owner_id,
        name: req.name,
        url: req.url,
        auth_token: req
            .auth_token
            .unwrap_or_else(generate_application_secret),
        permissions: req.permissions,
        klinks: req.klinks,
        active: req.active,
    };

    if !access::can_access_application(&actor, &candidate) {
        return Err(ServiceError::Forbidden.into());
    }
    check_references(&state, &candidate).await?;

    let application = state.store.create_application(candidate).await?;

    tracing::info!(
        application_id = %application.id,
        owner_id = %application.owner_id,
        created_by = %actor.id,
        "Application created"
    );
    Ok(Json(application.into()))
}

#[utoipa::path(
    put,
    path = "/api/2.0/applications/{id}",
    params(("id" = i64, Path, description = "Application id")),
    request_body = ApplicationRequest,
    responses(
        (status = 200, description = "Application updated", body = ApplicationResponse),
        (status = 400, description = "Unknown owner or permission", body = ErrorResponse),
        (status = 403, description = "Caller may not update this application", body = ErrorResponse),
        (status = 404, description = "Unknown application", body = ErrorResponse),
        (status = 409, description = "URL already registered", body = ErrorResponse)
    ),
    tag = "Applications",
    security(("bearer_auth" = []))
)]
pub async fn update_application(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<ApplicationRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let mut application = load_for(&state, &actor, id).await?;

    if let Some(owner_id) = req.owner_id {
        if owner_id != application.owner_id && !access::can_reassign_application_owner(&actor) {
            return Err(ServiceError::Forbidden.into());
        }
        application.owner_id = owner_id;
    }

    application.name = req.name;
    application.url = req.url;
    if let Some(auth_token) = req.auth_token {
        application.auth_token = auth_token;
    }
    application.permissions = req.permissions;
    application.klinks = req.klinks;
    application.active = req.active;

    check_references(&state, &application).await?;
    state.store.replace_application(&application).await?;

    tracing::info!(application_id = %application.id, updated_by = %actor.id, "Application updated");
    Ok(Json(application.into()))
}

#[utoipa::path(
    delete,
    path = "/api/2.0/applications/{id}",
    params(("id" = i64, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application deleted", body = EmptyResponse),
        (status = 403, description = "Caller may not delete this application", body = ErrorResponse),
        (status = 404, description = "Unknown application", body = ErrorResponse)
    ),
    tag = "Applications",
    security(("bearer_auth" = []))
)]
pub async fn delete_application(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<EmptyResponse>, AppError> {
    let application = load_for(&state, &actor, id).await?;
    state.store.delete_application(application.id).await?;

    tracing::info!(application_id = %id, deleted_by = %actor.id, "Application deleted");
    Ok(Json(EmptyResponse::default()))
}

async fn load_for(state: &AppState, actor: &Identity, id: i64) -> Result<Application, AppError> {
    let application = state
        .store
        .get_application_by_id(id)
        .await?
        .ok_or(ServiceError::NotFound)?;

    if !access::can_access_application(actor, &application) {
        return Err(ServiceError::Forbidden.into());
    }
    Ok(application)
}

/// The owner must exist and every permission must be a known one.
async fn check_references(state: &AppState, application: &Application) -> Result<(), AppError> {
    if state
        .store
        .get_registrant_by_id(application.owner_id)
        .await?
        .is_none()
    {
        return Err(ServiceError::Validation(format!(
            "Unknown owner: {}",
            application.owner_id
        ))
        .into());
    }

    let known: HashSet<String> = state
        .store
        .list_permissions()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    if let Some(unknown) = application
        .permissions
        .iter()
        .find(|name| !known.contains(name.as_str()))
    {
        return Err(ServiceError::Validation(format!("Unknown permission: {}", unknown)).into());
    }

    Ok(())
}
