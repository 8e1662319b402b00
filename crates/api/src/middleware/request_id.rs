//! Request ID middleware.
//!
//! Reuses an `x-request-id` header set by a proxy, otherwise generates a
//! UUID v4. The ID is recorded on the request span, tagged on the Sentry
//! scope and echoed back in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID that is trusted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn echoed_id(incoming: Option<&str>) -> String {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id_middleware));

        let mut request = Request::builder().uri("/");
        if let Some(id) = incoming {
            request = request.header(REQUEST_ID_HEADER, id);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_upstream_id_is_kept() {
        assert_eq!(echoed_id(Some("edge-42")).await, "edge-42");

        let longest = "a".repeat(MAX_REQUEST_ID_LEN);
        assert_eq!(echoed_id(Some(&longest)).await, longest);
    }

    #[tokio::test]
    async fn test_missing_or_empty_id_is_generated() {
        assert!(Uuid::parse_str(&echoed_id(None).await).is_ok());
        assert!(Uuid::parse_str(&echoed_id(Some("")).await).is_ok());
    }

    #[tokio::test]
    async fn test_overlong_id_is_replaced() {
        let overlong = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        let id = echoed_id(Some(&overlong)).await;

        assert_ne!(id, overlong);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
