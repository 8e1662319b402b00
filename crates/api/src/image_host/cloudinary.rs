//! Cloudinary upload API client.
//!
//! Uses signed requests: the request parameters (minus `file`, `api_key` and
//! the signature itself) are sorted, joined as `key=value&...`, suffixed with
//! the API secret and hashed with SHA-256.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, instrument, warn};

use super::{DestroyOutcome, ImageHost, ImageHostError, ImageUpload, UploadedImage};
use crate::config::CloudinaryConfig;

const SIGNATURE_ALGORITHM: &str = "sha256";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Cloudinary client for uploading and destroying images.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    api_base: String,
    upload_folder: Option<String>,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryClient")
            .field("cloud_name", &self.cloud_name)
            .field("api_secret", &"[REDACTED]")
            .field("upload_folder", &self.upload_folder)
            .finish_non_exhaustive()
    }
}

impl CloudinaryClient {
    /// Create a new client from account configuration.
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_folder: config.upload_folder.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{action}", self.api_base, self.cloud_name)
    }

    /// Sign a set of request parameters.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> =
            params.iter().filter(|(_, v)| !v.is_empty()).collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Turn a non-success response into an API error.
    async fn api_error(response: reqwest::Response) -> ImageHostError {
        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status.to_string(),
        };
        ImageHostError::Api(message)
    }

    fn timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    #[instrument(skip(self, image), fields(file_name = %image.file_name, size = image.bytes.len()))]
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, ImageHostError> {
        let mut params = vec![
            ("timestamp", Self::timestamp()),
            ("transformation", image.transform.to_param()),
        ];
        if let Some(folder) = &self.upload_folder {
            params.push(("folder", folder.clone()));
        }
        let signature = self.sign(&params);

        let mut file = Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            file = file
                .mime_str(content_type)
                .map_err(|e| ImageHostError::Request(e.to_string()))?;
        }

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", SIGNATURE_ALGORITHM);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageHostError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::api_error(response).await;
            error!(error = %err, "Cloudinary rejected upload");
            return Err(err);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ImageHostError::Response(e.to_string()))?;

        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| ImageHostError::Response("upload response has no URL".to_string()))?;

        debug!(public_id = %body.public_id, "Image uploaded to Cloudinary");

        Ok(UploadedImage {
            url,
            public_id: body.public_id,
        })
    }

    #[instrument(skip(self))]
    async fn destroy(&self, public_id: &str) -> Result<DestroyOutcome, ImageHostError> {
        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", Self::timestamp()),
        ];
        let signature = self.sign(&params);

        let mut form: Vec<(&str, String)> = params;
        form.push(("api_key", self.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", SIGNATURE_ALGORITHM.to_string()));

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| ImageHostError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::api_error(response).await;
            error!(error = %err, "Cloudinary rejected destroy");
            return Err(err);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| ImageHostError::Response(e.to_string()))?;

        if body.result != "ok" {
            warn!(result = %body.result, "Cloudinary did not destroy image");
        }

        Ok(DestroyOutcome {
            result: body.result,
        })
    }
}
