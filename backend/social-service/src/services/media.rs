//! External image store client.
//!
//! Uploads go to a Cloudinary-compatible HTTP API using signed requests. The
//! store hands back a hosted URL; we keep only that URL on the account/post.
use crate::config::MediaConfig;
use resilience::{object_storage_config, with_timeout};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Image upload service is not configured properly")]
    NotConfigured,

    #[error("Image store unreachable: {0}")]
    Unreachable(String),

    #[error("Image store rejected the request: {0}")]
    Rejected(String),

    #[error("Image store call timed out")]
    Timeout,
}

/// What to upload
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Data URI or remote URL, passed through to the store as-is
    Encoded(String),
    /// Raw file bytes from a multipart upload
    Bytes {
        data: Vec<u8>,
        content_type: String,
        filename: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: Option<String>,
    pub transformation: Option<String>,
}

impl UploadOptions {
    /// 400x400 fill crop with automatic quality, stored under `profile-pictures`
    pub fn profile_picture() -> Self {
        Self {
            folder: Some("profile-pictures".to_string()),
            transformation: Some("c_fill,h_400,w_400/q_auto".to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload an image and return its hosted URL
    async fn upload(&self, source: ImageSource, options: &UploadOptions)
        -> Result<String, MediaError>;

    /// Delete a previously uploaded image by public id
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Public id of a hosted image: the path after `/upload/`, minus any version
/// segment and the file extension. Falls back to the last path segment.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let tail = match path.split_once("/upload/") {
        Some((_, rest)) => rest,
        None => path.rsplit('/').next()?,
    };

    let mut segments: Vec<&str> = tail.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(first) = segments.first() {
        let is_version =
            first.len() > 1 && first.starts_with('v') && first[1..].chars().all(|c| c.is_ascii_digit());
        if is_version && segments.len() > 1 {
            segments.remove(0);
        }
    }

    let joined = segments.join("/");
    let id = match joined.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem.to_string(),
        _ => joined,
    };
    (!id.is_empty()).then_some(id)
}

/// Request signature: sorted `key=value` pairs joined by `&`, secret appended, SHA-1 hex
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

pub struct CloudinaryImageStore {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryImageStore {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", self.api_base, self.cloud_name, action)
    }

    fn signed_fields(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign_params(&params, &self.api_secret);
        params.insert("signature", signature);
        params.insert("api_key", self.api_key.clone());
        params
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, MediaError> {
        let deadline = object_storage_config().timeout.duration;
        let response = with_timeout(deadline, request.send())
            .await
            .map_err(|_| MediaError::Timeout)?
            .map_err(|e| MediaError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("{}: {}", status, body)));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(
        &self,
        source: ImageSource,
        options: &UploadOptions,
    ) -> Result<String, MediaError> {
        let mut params = BTreeMap::new();
        if let Some(folder) = &options.folder {
            params.insert("folder", folder.clone());
        }
        if let Some(transformation) = &options.transformation {
            params.insert("transformation", transformation.clone());
        }

        let mut form = reqwest::multipart::Form::new();
        for (key, value) in self.signed_fields(params) {
            form = form.text(key, value);
        }
        form = match source {
            ImageSource::Encoded(data) => form.text("file", data),
            ImageSource::Bytes {
                data,
                content_type,
                filename,
            } => {
                let part = reqwest::multipart::Part::bytes(data)
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(|e| MediaError::Rejected(format!("invalid content type: {}", e)))?;
                form.part("file", part)
            }
        };

        let response = self
            .send(self.client.post(self.endpoint("upload")).multipart(form))
            .await?;
        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Rejected(format!("unexpected upload response: {}", e)))?;

        info!(url = %uploaded.secure_url, "Image uploaded");
        Ok(uploaded.secure_url)
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());

        let response = self
            .send(
                self.client
                    .post(self.endpoint("destroy"))
                    .form(&self.signed_fields(params)),
            )
            .await?;
        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Rejected(format!("unexpected destroy response: {}", e)))?;

        debug!(public_id, result = %destroyed.result, "Image destroy requested");
        Ok(())
    }
}

/// Stand-in when credentials are missing: every call fails with `NotConfigured`
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredImageStore;

#[async_trait::async_trait]
impl ImageStore for UnconfiguredImageStore {
    async fn upload(&self, _: ImageSource, _: &UploadOptions) -> Result<String, MediaError> {
        Err(MediaError::NotConfigured)
    }

    async fn destroy(&self, _: &str) -> Result<(), MediaError> {
        Err(MediaError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Remove a replaced or orphaned image. Failures leave an unreferenced image in
/// the store and are only logged.
pub async fn destroy_quietly(images: &dyn ImageStore, url: &str) {
    let Some(public_id) = public_id_from_url(url) else {
        debug!(url, "No public id in image url; nothing to destroy");
        return;
    };
    if let Err(e) = images.destroy(&public_id).await {
        tracing::warn!(public_id = %public_id, error = %e, "Failed to destroy image");
    }
}

/// Pick the image store implementation for the given configuration
pub fn image_store_from_config(config: &MediaConfig) -> std::sync::Arc<dyn ImageStore> {
    match (&config.cloud_name, &config.api_key, &config.api_secret) {
        (Some(cloud), Some(key), Some(secret)) => std::sync::Arc::new(CloudinaryImageStore::new(
            cloud.clone(),
            key.clone(),
            secret.clone(),
        )),
        _ => {
            tracing::warn!("Image store credentials missing; uploads will be rejected");
            std::sync::Arc::new(UnconfiguredImageStore)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_from_versioned_url() {
        assert_eq!(
            public_id_from_url(
                "https://res.cloudinary.com/demo/image/upload/v1712/profile-pictures/abc123.jpg"
            )
            .as_deref(),
            Some("profile-pictures/abc123")
        );
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/v1712/xyz.png")
                .as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn test_public_id_fallback_to_last_segment() {
        assert_eq!(
            public_id_from_url("https://cdn.example.com/a/b/photo.webp?x=1").as_deref(),
            Some("photo")
        );
        assert_eq!(public_id_from_url("https://cdn.example.com/").as_deref(), None);
    }

    #[test]
    fn test_signature_is_sorted_sha1() {
        // Reference vector from the store's signing documentation
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());
        params.insert("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string());
        assert_eq!(
            sign_params(&params, "abcd"),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn test_profile_picture_options() {
        let options = UploadOptions::profile_picture();
        assert_eq!(options.folder.as_deref(), Some("profile-pictures"));
        assert!(options.transformation.unwrap().contains("w_400"));
    }

    #[tokio::test]
    async fn test_unconfigured_store_rejects() {
        let store = UnconfiguredImageStore;
        assert!(!store.is_configured());
        let err = store
            .upload(ImageSource::Encoded("data:".into()), &UploadOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Image upload service is not configured properly");
    }

    #[test]
    fn test_store_selection() {
        let config = MediaConfig {
            cloud_name: Some("demo".into()),
            api_key: None,
            api_secret: Some("s".into()),
            max_upload_bytes: 1,
        };
        assert!(!image_store_from_config(&config).is_configured());
    }
}
