//! HTTP tests for the user profile, health and middleware behavior.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use free_ads_api::middleware::REQUEST_ID_HEADER;
use free_ads_integration_tests::TestContext;

#[tokio::test]
async fn test_get_user() {
    let ctx = TestContext::new();

    let response = ctx
        .get_as(ctx.owner, &format!("/api/users/{}", ctx.owner))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let user = response.json();
    assert_eq!(user["id"], 1);
    assert_eq!(user["username"], "ana");
    assert!(user.get("lastActive").is_some());
}

#[tokio::test]
async fn test_get_unknown_user() {
    let ctx = TestContext::new();

    let response = ctx.get_as(ctx.owner, "/api/users/404").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "Корисникот не постои");
}

#[tokio::test]
async fn test_get_user_requires_token() {
    let ctx = TestContext::new();
    let request = Request::builder()
        .uri("/api/users/1")
        .body(Body::empty())
        .expect("valid request");

    assert_eq!(ctx.send(request).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    for path in ["/health", "/health/ready"] {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("valid request");
        let response = ctx.send(request).await;
        assert_eq!(response.status, StatusCode::OK, "{path}");
        assert_eq!(response.text(), "ok");
    }
}

#[tokio::test]
async fn test_request_id_is_generated_or_echoed() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("valid request");
    let generated = ctx.send(request).await;
    let id = generated
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .expect("request id header");
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "edge-1234")
        .body(Body::empty())
        .expect("valid request");
    let echoed = ctx.send(request).await;
    assert_eq!(
        echoed.headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
        Some("edge-1234")
    );
}

#[tokio::test]
async fn test_cors_preflight_allows_spa_origin() {
    let ctx = TestContext::new();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(format!("/api/{}/photos/{}", ctx.owner, ctx.ad))
        .header(header::ORIGIN, "http://localhost:4200")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .expect("valid request");

    let response = ctx.send(request).await;
    assert_eq!(
        response
            .headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:4200")
    );
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let ctx = TestContext::new();
    // Test config allows 1 MiB
    let bytes = vec![0_u8; 2 * 1024 * 1024];

    let response = ctx
        .upload_as(ctx.owner, ctx.owner, ctx.ad, "huge.jpg", &bytes)
        .await;
    assert!(response.status.is_client_error());
    assert!(ctx.images.untouched());
}
