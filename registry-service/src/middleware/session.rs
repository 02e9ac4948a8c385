//! Two-stage session handling.
//!
//! [`session_middleware`] runs on every request and attaches an [`Identity`]
//! when a valid bearer token is present, without ever rejecting. Routes that
//! need a caller are wrapped in [`require_authenticated`] or take a
//! [`CurrentUser`] argument, which answer `401` when no identity was attached.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{
    models::Identity,
    services::{ServiceError, SessionService},
};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Decode the bearer token, if any, into a request extension.
pub async fn session_middleware(
    State(sessions): State<SessionService>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match bearer_token(req.headers()) {
        Some(token) => match sessions.verify(token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session token");
                None
            }
        },
        None => None,
    };

    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}

/// Reject requests that carry no authenticated identity.
pub async fn require_authenticated(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<Identity>().is_none() {
        return Err(ServiceError::Unauthorized.into());
    }
    Ok(next.run(req).await)
}

/// The authenticated caller.
pub struct CurrentUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ServiceError::Unauthorized.into())
    }
}
