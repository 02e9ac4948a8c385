pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{ip_rate_limit_middleware, ClientIpSource, IpRateLimit},
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::RegistryConfig;
use crate::services::{AuthService, Emailer, SessionService, Storer};

/// Location of the OpenAPI document, relative to the base path.
pub const OPENAPI_PATH: &str = "/api/openapi.json";

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::session::login,
        handlers::auth::session::refresh,
        handlers::auth::registration::register,
        handlers::auth::registration::inspect_email_verification,
        handlers::auth::registration::confirm_email_verification,
        handlers::auth::password::request_password_reset,
        handlers::auth::password::change_password,
        handlers::registrant::list_registrants,
        handlers::registrant::get_registrant,
        handlers::registrant::create_registrant,
        handlers::registrant::update_registrant,
        handlers::registrant::delete_registrant,
        handlers::application::list_applications,
        handlers::application::get_application,
        handlers::application::create_application,
        handlers::application::update_application,
        handlers::application::delete_application,
        handlers::klink::list_klinks,
        handlers::klink::get_klink,
        handlers::klink::create_klink,
        handlers::klink::update_klink,
        handlers::klink::delete_klink,
        handlers::permission::list_permissions,
        handlers::permission::create_permission,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::EmptyResponse,
            dtos::auth::LoginRequest,
            dtos::auth::SessionResponse,
            dtos::auth::RegistrationRequest,
            dtos::auth::EmailVerificationResponse,
            dtos::auth::ConfirmEmailRequest,
            dtos::auth::PasswordResetRequest,
            dtos::auth::ChangePasswordRequest,
            dtos::registrant::RegistrantResponse,
            dtos::registrant::CreateRegistrantRequest,
            dtos::registrant::UpdateRegistrantRequest,
            dtos::application::ApplicationResponse,
            dtos::application::ApplicationRequest,
            dtos::klink::KlinkResponse,
            dtos::klink::KlinkRequest,
            dtos::permission::CreatePermissionRequest,
            models::Permission,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sessions, registration and password recovery"),
        (name = "Registrants", description = "Account administration"),
        (name = "Applications", description = "Applications registered against the network"),
        (name = "K-Links", description = "Nodes of the network"),
        (name = "Permissions", description = "Permissions applications can be granted"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: RegistryConfig,
    pub store: Arc<dyn Storer>,
    pub sessions: SessionService,
    pub auth_service: AuthService,
    pub login_rate_limiter: IpRateLimit,
    pub register_rate_limiter: IpRateLimit,
    pub password_reset_rate_limiter: IpRateLimit,
}

impl AppState {
    /// Wire the services and per-route rate limiters from the configuration.
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn Storer>,
        email: Arc<dyn Emailer>,
        sessions: SessionService,
    ) -> Self {
        let limits = &config.rate_limit;
        let source = if limits.trust_forwarded_for {
            ClientIpSource::ForwardedFor
        } else {
            ClientIpSource::PeerAddress
        };
        let login_rate_limiter =
            IpRateLimit::new(limits.login_attempts, limits.login_window_seconds, source);
        let register_rate_limiter =
            IpRateLimit::new(limits.register_attempts, limits.register_window_seconds, source);
        let password_reset_rate_limiter = IpRateLimit::new(
            limits.password_reset_attempts,
            limits.password_reset_window_seconds,
            source,
        );

        let auth_service = AuthService::new(
            store.clone(),
            email,
            sessions.clone(),
            config.http.clone(),
        );

        Self {
            config,
            store,
            sessions,
            auth_service,
            login_rate_limiter,
            register_rate_limiter,
            password_reset_rate_limiter,
        }
    }
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    // Public auth routes. The session path also answers GET for refresh, which
    // the `CurrentUser` extractor guards.
    let auth_routes = Router::new()
        .route(
            "/auth/session",
            post(handlers::auth::login)
                .layer(from_fn_with_state(
                    state.login_rate_limiter.clone(),
                    ip_rate_limit_middleware,
                ))
                .merge(get(handlers::auth::refresh)),
        )
        .route(
            "/auth/registrations",
            post(handlers::auth::register).layer(from_fn_with_state(
                state.register_rate_limiter.clone(),
                ip_rate_limit_middleware,
            )),
        )
        .route(
            "/auth/email-verification/:token",
            get(handlers::auth::inspect_email_verification)
                .post(handlers::auth::confirm_email_verification),
        )
        .route(
            "/auth/password-reset",
            post(handlers::auth::request_password_reset).layer(from_fn_with_state(
                state.password_reset_rate_limiter.clone(),
                ip_rate_limit_middleware,
            )),
        )
        .route(
            "/auth/change-password/:token",
            post(handlers::auth::change_password),
        )
        .route(
            "/permissions",
            get(handlers::permission::list_permissions)
                .post(handlers::permission::create_permission),
        );

    let protected_routes = Router::new()
        .route(
            "/registrants",
            get(handlers::registrant::list_registrants)
                .post(handlers::registrant::create_registrant),
        )
        .route(
            "/registrants/:id",
            get(handlers::registrant::get_registrant)
                .put(handlers::registrant::update_registrant)
                .delete(handlers::registrant::delete_registrant),
        )
        .route(
            "/applications",
            get(handlers::application::list_applications)
                .post(handlers::application::create_application),
        )
        .route(
            "/applications/:id",
            get(handlers::application::get_application)
                .put(handlers::application::update_application)
                .delete(handlers::application::delete_application),
        )
        .route(
            "/klinks",
            get(handlers::klink::list_klinks).post(handlers::klink::create_klink),
        )
        .route(
            "/klinks/:id",
            get(handlers::klink::get_klink)
                .put(handlers::klink::update_klink)
                .delete(handlers::klink::delete_klink),
        )
        .route_layer(from_fn(middleware::require_authenticated));

    let mut api = Router::new()
        .route("/health", get(health_check))
        .nest("/api/2.0", auth_routes.merge(protected_routes))
        .route(
            "/api/1.0/application.authenticate",
            post(handlers::v1::authenticate_application),
        );

    if state.config.http.enable_swagger {
        api = api.merge(SwaggerUi::new("/docs").url(OPENAPI_PATH, ApiDoc::openapi()));
    } else {
        api = api.route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }));
    }

    let base_path = state.config.http.normalized_base_path();
    let app = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(&base_path, api)
    };

    let cors = cors_layer(&state.config.http.allowed_origins)?;

    let app = app
        .layer(from_fn_with_state(
            state.sessions.clone(),
            middleware::session_middleware,
        ))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| make_request_span(request)),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let origins = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed = allowed_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>().map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(parsed)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ]))
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Store is unreachable", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    })))
}
