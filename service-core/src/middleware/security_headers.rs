use axum::{extract::Request, http::header, middleware::Next, response::Response};

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let path = req.uri().path();
    // Swagger UI needs inline scripts and same-origin framing
    let is_docs_route = path.contains("/docs") || path.ends_with("/openapi.json");

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        header::HeaderValue::from_static("1; mode=block"),
    );

    if is_docs_route {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static(
                "default-src 'self'; script-src 'self' 'unsafe-inline'; \
                 style-src 'self' 'unsafe-inline'; img-src 'self' data:",
            ),
        );
        headers.insert(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("SAMEORIGIN"),
        );
    } else {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
        headers.insert(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;

    async fn headers_for(path: &str) -> axum::http::HeaderMap {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/docs", get(|| async { "docs" }))
            .layer(from_fn(security_headers_middleware))
            .oneshot(HttpRequest::builder().uri(path).body(Body::empty()).expect("request"))
            .await
            .expect("response")
            .headers()
            .clone()
    }

    #[tokio::test]
    async fn test_api_routes_are_locked_down() {
        let headers = headers_for("/health").await;
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    }

    #[tokio::test]
    async fn test_docs_may_run_inline_scripts() {
        let headers = headers_for("/docs").await;
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "SAMEORIGIN");
        assert!(headers
            .get(header::CONTENT_SECURITY_POLICY)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("'unsafe-inline'")));
    }
}
