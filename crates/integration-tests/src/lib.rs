//! Integration tests for Free Ads.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP tests against the router with in-memory collaborators
//! cargo test -p free-ads-integration-tests
//!
//! # Store tests against PostgreSQL (needs FREE_ADS_TEST_DATABASE_URL)
//! cargo test -p free-ads-integration-tests -- --ignored
//! ```
//!
//! [`TestContext`] builds the real axum router over a [`MemoryStore`] and a
//! [`RecordingImageHost`], seeded with two users and one ad, and mints bearer
//! tokens the way the account service does.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::SecretString;
use tower::ServiceExt;

use free_ads_api::config::{ApiConfig, CloudinaryConfig};
use free_ads_api::db::MemoryStore;
use free_ads_api::image_host::{
    DestroyOutcome, ImageHost, ImageHostError, ImageUpload, UploadedImage,
};
use free_ads_api::messages::Locale;
use free_ads_api::middleware::Claims;
use free_ads_api::state::AppState;
use free_ads_core::{ClassifiedAdId, UserId};

/// Secret shared by the test token issuer and the API.
pub const JWT_SECRET: &str = "Zq7#Lm2!Vx9$Rt4&Kp8*Wn3^Hs6@Jd1%";

/// Image host double that records every call.
#[derive(Debug, Default)]
pub struct RecordingImageHost {
    uploads: Mutex<Vec<ImageUpload>>,
    destroyed: Mutex<Vec<String>>,
    destroy_result: Mutex<Option<String>>,
    fail_uploads: AtomicBool,
}

impl RecordingImageHost {
    /// File names of all uploads, in order.
    pub fn uploaded_files(&self) -> Vec<String> {
        self.uploads
            .lock()
            .expect("uploads lock")
            .iter()
            .map(|u| u.file_name.clone())
            .collect()
    }

    /// Public IDs passed to destroy, in order.
    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().expect("destroyed lock").clone()
    }

    /// Answer later destroy calls with `result` instead of `ok`.
    pub fn answer_destroy_with(&self, result: &str) {
        *self.destroy_result.lock().expect("destroy_result lock") = Some(result.to_string());
    }

    /// Make later uploads fail at the transport level.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Whether nothing was uploaded or destroyed.
    pub fn untouched(&self) -> bool {
        self.uploaded_files().is_empty() && self.destroyed().is_empty()
    }
}

#[async_trait]
impl ImageHost for RecordingImageHost {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, ImageHostError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ImageHostError::Request("connection reset".to_string()));
        }
        let mut uploads = self.uploads.lock().expect("uploads lock");
        uploads.push(image);
        let n = uploads.len();
        Ok(UploadedImage {
            url: format!("https://res.cloudinary.com/test/image/upload/ads/{n}.jpg"),
            public_id: format!("ads/{n}"),
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<DestroyOutcome, ImageHostError> {
        self.destroyed
            .lock()
            .expect("destroyed lock")
            .push(public_id.to_string());
        let result = self
            .destroy_result
            .lock()
            .expect("destroy_result lock")
            .clone()
            .unwrap_or_else(|| "ok".to_string());
        Ok(DestroyOutcome { result })
    }
}

/// API configuration for tests.
pub fn test_config(locale: Locale) -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://localhost/free_ads_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 5000,
        cors_origin: HeaderValue::from_static("http://localhost:4200"),
        locale,
        max_upload_bytes: 1024 * 1024,
        jwt_secret: SecretString::from(JWT_SECRET),
        cloudinary: CloudinaryConfig {
            cloud_name: "test".to_string(),
            api_key: "1234".to_string(),
            api_secret: SecretString::from("unused-in-tests"),
            api_base: "http://127.0.0.1:9/v1_1".to_string(),
            upload_folder: None,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A response read into memory.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

/// Router plus the collaborators behind it.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub images: Arc<RecordingImageHost>,
    pub app: Router,
    /// Owner of [`ad`](Self::ad).
    pub owner: UserId,
    /// A second user without ads.
    pub other: UserId,
    pub ad: ClassifiedAdId,
}

impl TestContext {
    /// Context with Macedonian messages, the production default.
    pub fn new() -> Self {
        Self::with_locale(Locale::Mk)
    }

    pub fn with_locale(locale: Locale) -> Self {
        let store = Arc::new(MemoryStore::new());
        let owner = store.insert_user("ana").expect("seed owner");
        let other = store.insert_user("boris").expect("seed other user");
        let ad = store
            .insert_classified_ad(owner, "Mountain bike")
            .expect("seed ad");
        let images = Arc::new(RecordingImageHost::default());

        let state = AppState::new(test_config(locale), store.clone(), images.clone());
        let app = free_ads_api::app(state);

        Self {
            store,
            images,
            app,
            owner,
            other,
            ad,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Upload `bytes` as a photo of `ad` on behalf of `user`, authenticated as `caller`.
    pub async fn upload_as(
        &self,
        caller: UserId,
        user: UserId,
        ad: ClassifiedAdId,
        file_name: &str,
        bytes: &[u8],
    ) -> TestResponse {
        let (content_type, body) = multipart_body(file_name, bytes, Some("photo description"));
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/{user}/photos/{ad}"))
            .header(header::AUTHORIZATION, bearer(caller))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("valid request");
        self.send(request).await
    }

    /// Owner uploads a photo to the seeded ad.
    pub async fn upload(&self, file_name: &str) -> TestResponse {
        self.upload_as(self.owner, self.owner, self.ad, file_name, b"\xFF\xD8\xFFjpeg")
            .await
    }

    pub async fn set_main_as(
        &self,
        caller: UserId,
        user: UserId,
        ad: ClassifiedAdId,
        photo_id: i64,
    ) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/{user}/photos/{ad}/setMain/{photo_id}"))
            .header(header::AUTHORIZATION, bearer(caller))
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    pub async fn set_main(&self, photo_id: i64) -> TestResponse {
        self.set_main_as(self.owner, self.owner, self.ad, photo_id).await
    }

    pub async fn delete_as(
        &self,
        caller: UserId,
        user: UserId,
        ad: ClassifiedAdId,
        photo_id: i64,
    ) -> TestResponse {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/{user}/photos/{ad}/{photo_id}"))
            .header(header::AUTHORIZATION, bearer(caller))
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    pub async fn delete(&self, photo_id: i64) -> TestResponse {
        self.delete_as(self.owner, self.owner, self.ad, photo_id).await
    }

    /// GET a path with a bearer token for `caller`.
    pub async fn get_as(&self, caller: UserId, path: &str) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .header(header::AUTHORIZATION, bearer(caller))
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a token for `user_id` the way the account service does.
pub fn token_for(user_id: UserId) -> String {
    let claims = Claims {
        nameid: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        unique_name: None,
    };
    encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode token")
}

/// `Authorization` header value for `user_id`.
pub fn bearer(user_id: UserId) -> String {
    format!("Bearer {}", token_for(user_id))
}

/// Build a `multipart/form-data` body with a `file` and optional `description`.
///
/// Returns the content type (with boundary) and the body.
pub fn multipart_body(file_name: &str, bytes: &[u8], description: Option<&str>) -> (String, Vec<u8>) {
    let boundary = format!("free-ads-{}", uuid::Uuid::new_v4().simple());
    let mut body = Vec::new();

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");

    if let Some(description) = description {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{description}\r\n"
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
