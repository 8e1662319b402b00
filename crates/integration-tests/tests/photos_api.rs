//! HTTP tests for the ad photo endpoints.
//!
//! Run the full router over in-memory collaborators; no database or image
//! host is needed.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use free_ads_api::db::ClassifiedAdsStore;
use free_ads_api::messages::Locale;
use free_ads_core::{ClassifiedAdId, PhotoId};
use free_ads_integration_tests::{TestContext, bearer, multipart_body};

const CANNOT_DELETE_MAIN_MK: &str = "Не можете да ја бришете главната слика";

fn photo_path(ctx: &TestContext, photo_id: i64) -> String {
    format!("/api/{}/photos/{photo_id}", ctx.owner)
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_photo_lifecycle_scenario() {
    let ctx = TestContext::new();

    let a = ctx.upload("a.jpg").await;
    assert_eq!(a.status, StatusCode::CREATED);
    assert_eq!(
        a.headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/api/1/photos/1")
    );
    let a = a.json();
    assert_eq!(a["isMain"], true);
    assert_eq!(a["publicId"], "ads/1");
    assert_eq!(a["description"], "photo description");

    let b = ctx.upload("b.jpg").await;
    assert_eq!(b.status, StatusCode::CREATED);
    assert_eq!(b.json()["isMain"], false);

    let set_main = ctx.set_main(2).await;
    assert_eq!(set_main.status, StatusCode::NO_CONTENT);
    assert!(set_main.body.is_empty());

    let a = ctx.get_as(ctx.owner, &photo_path(&ctx, 1)).await;
    assert_eq!(a.json()["isMain"], false);
    let b = ctx.get_as(ctx.owner, &photo_path(&ctx, 2)).await;
    assert_eq!(b.json()["isMain"], true);

    let delete_a = ctx.delete(1).await;
    assert_eq!(delete_a.status, StatusCode::OK);
    assert_eq!(ctx.images.destroyed(), vec!["ads/1".to_string()]);
    let gone = ctx.get_as(ctx.owner, &photo_path(&ctx, 1)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let delete_b = ctx.delete(2).await;
    assert_eq!(delete_b.status, StatusCode::BAD_REQUEST);
    assert_eq!(delete_b.text(), CANNOT_DELETE_MAIN_MK);
    let still_there = ctx.get_as(ctx.owner, &photo_path(&ctx, 2)).await;
    assert_eq!(still_there.status, StatusCode::OK);
}

#[tokio::test]
async fn test_second_upload_never_displaces_main() {
    let ctx = TestContext::new();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        assert_eq!(ctx.upload(name).await.status, StatusCode::CREATED);
    }

    let ad = ctx
        .store
        .get_classified_ad_detail(ctx.ad)
        .await
        .expect("store read")
        .expect("ad exists");
    assert_eq!(ad.photos.len(), 3);
    assert_eq!(ad.main_photo_count(), 1);
    assert_eq!(ad.main_photo().map(|p| p.id), Some(PhotoId::new(1)));
    assert_eq!(ctx.images.uploaded_files(), vec!["a.jpg", "b.jpg", "c.jpg"]);
}

#[tokio::test]
async fn test_set_main_on_main_photo_is_refused() {
    let ctx = TestContext::with_locale(Locale::En);
    ctx.upload("a.jpg").await;

    let response = ctx.set_main(1).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "This is already the main photo");

    let a = ctx.get_as(ctx.owner, &photo_path(&ctx, 1)).await;
    assert_eq!(a.json()["isMain"], true);
}

#[tokio::test]
async fn test_get_photo_needs_token_but_not_ownership() {
    let ctx = TestContext::new();
    ctx.upload("a.jpg").await;

    let as_other = ctx.get_as(ctx.other, &photo_path(&ctx, 1)).await;
    assert_eq!(as_other.status, StatusCode::OK);

    let anonymous = ctx
        .send(
            Request::builder()
                .uri(photo_path(&ctx, 1))
                .body(Body::empty())
                .expect("valid request"),
        )
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let missing = ctx.get_as(ctx.owner, &photo_path(&ctx, 99)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.text(), "Сликата не постои");
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_identity_mismatch_has_no_side_effects() {
    let ctx = TestContext::new();
    ctx.upload("a.jpg").await;
    ctx.upload("b.jpg").await;
    let commits = ctx.store.commit_count();
    let uploads = ctx.images.uploaded_files().len();

    let upload = ctx
        .upload_as(ctx.other, ctx.owner, ctx.ad, "evil.jpg", b"data")
        .await;
    let set_main = ctx.set_main_as(ctx.other, ctx.owner, ctx.ad, 2).await;
    let delete = ctx.delete_as(ctx.other, ctx.owner, ctx.ad, 2).await;

    for response in [&upload, &set_main, &delete] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(ctx.store.commit_count(), commits);
    assert_eq!(ctx.images.uploaded_files().len(), uploads);
    assert!(ctx.images.destroyed().is_empty());
}

#[tokio::test]
async fn test_identity_mismatch_is_checked_before_the_body() {
    let ctx = TestContext::new();
    let uri = format!("/api/{}/photos/{}", ctx.owner, ctx.ad);

    let bodies = [
        ("text/plain", b"garbage-not-multipart".to_vec()),
        ("multipart/form-data; boundary=x", b"garbage-not-multipart".to_vec()),
        (
            "multipart/form-data; boundary=x",
            multipart_body("huge.jpg", &vec![0_u8; 2 * 1024 * 1024], None).1,
        ),
    ];

    for (content_type, body) in bodies {
        let request = Request::builder()
            .method("POST")
            .uri(&uri)
            .header(header::AUTHORIZATION, bearer(ctx.other))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("valid request");
        let response = ctx.send(request).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{content_type}");
    }

    // The owner sending the same malformed form gets a bad request
    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::AUTHORIZATION, bearer(ctx.owner))
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("garbage-not-multipart"))
        .expect("valid request");
    assert_eq!(ctx.send(request).await.status, StatusCode::BAD_REQUEST);
    assert!(ctx.images.untouched());
}

#[tokio::test]
async fn test_foreign_ad_is_unauthorized() {
    let ctx = TestContext::new();

    let response = ctx
        .upload_as(ctx.other, ctx.other, ctx.ad, "a.jpg", b"data")
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = ctx
        .upload_as(ctx.owner, ctx.owner, ClassifiedAdId::new(42), "a.jpg", b"data")
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(ctx.images.untouched());
}

#[tokio::test]
async fn test_photo_of_another_ad_is_unauthorized() {
    let ctx = TestContext::new();
    ctx.upload("a.jpg").await;
    let second_ad = ctx
        .store
        .insert_classified_ad(ctx.owner, "Helmet")
        .expect("seed ad");
    ctx.upload_as(ctx.owner, ctx.owner, second_ad, "h1.jpg", b"data")
        .await;
    ctx.upload_as(ctx.owner, ctx.owner, second_ad, "h2.jpg", b"data")
        .await;

    // Photo 3 belongs to the second ad
    assert_eq!(ctx.set_main(3).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.delete(3).await.status, StatusCode::UNAUTHORIZED);
    assert!(ctx.images.destroyed().is_empty());
}

#[tokio::test]
async fn test_invalid_tokens_are_rejected() {
    let ctx = TestContext::new();
    let (content_type, body) = multipart_body("a.jpg", b"data", None);

    for authorization in [None, Some("Bearer not-a-jwt"), Some("Basic YW5hOnB3")] {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/{}/photos/{}", ctx.owner, ctx.ad))
            .header(header::CONTENT_TYPE, content_type.clone());
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = ctx
            .send(builder.body(Body::from(body.clone())).expect("valid request"))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "Немате дозвола за оваа акција");
    }
    assert!(ctx.images.untouched());
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let ctx = TestContext::with_locale(Locale::En);

    let response = ctx
        .upload_as(ctx.owner, ctx.owner, ctx.ad, "empty.jpg", b"")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "No image was selected for upload");

    // A form without a file field is treated the same way
    let boundary = "no-file";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nlonely\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/{}/photos/{}", ctx.owner, ctx.ad))
        .header(header::AUTHORIZATION, bearer(ctx.owner))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("valid request");
    assert_eq!(ctx.send(request).await.status, StatusCode::BAD_REQUEST);

    assert!(ctx.images.untouched());
    assert_eq!(ctx.store.commit_count(), 0);
}

#[tokio::test]
async fn test_remote_delete_refusal_keeps_photo() {
    let ctx = TestContext::new();
    ctx.upload("a.jpg").await;
    ctx.upload("b.jpg").await;
    ctx.images.answer_destroy_with("not found");

    let response = ctx.delete(2).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Грешка при бришење на сликата");

    let b = ctx.get_as(ctx.owner, &photo_path(&ctx, 2)).await;
    assert_eq!(b.status, StatusCode::OK);
}

#[tokio::test]
async fn test_image_host_failure_is_bad_gateway() {
    let ctx = TestContext::new();
    ctx.images.fail_uploads(true);

    let response = ctx.upload("a.jpg").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(ctx.store.commit_count(), 0);
}

#[tokio::test]
async fn test_commit_failure_removes_uploaded_image() {
    let ctx = TestContext::with_locale(Locale::En);
    ctx.store.fail_commits(true);

    let response = ctx.upload("a.jpg").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Could not add the photo");
    assert_eq!(ctx.images.destroyed(), vec!["ads/1".to_string()]);
}

#[tokio::test]
async fn test_set_main_commit_failure() {
    let ctx = TestContext::with_locale(Locale::En);
    ctx.upload("a.jpg").await;
    ctx.upload("b.jpg").await;
    ctx.store.fail_commits(true);

    let response = ctx.set_main(2).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Could not set the photo to main");

    ctx.store.fail_commits(false);
    let a = ctx.get_as(ctx.owner, &photo_path(&ctx, 1)).await;
    assert_eq!(a.json()["isMain"], true);
}
