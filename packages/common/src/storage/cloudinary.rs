use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::error::StorageError;
use super::hash::sha256_hex;
use super::traits::{ImageStore, StoredImage, image_format, validate_public_id};
use crate::config::CloudinaryConfig;

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Image store that proxies uploads to the Cloudinary upload API.
///
/// Requests are signed with SHA-256 over the alphabetically sorted
/// parameters followed by the API secret.
pub struct CloudinaryImageStore {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    max_size: u64,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    width: Option<u32>,
    height: Option<u32>,
    format: Option<String>,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryImageStore {
    pub fn new(config: &CloudinaryConfig, max_size: u64) -> Result<Self, StorageError> {
        Self::with_api_base(config, max_size, DEFAULT_API_BASE)
    }

    /// Point the store at a different Cloudinary-compatible API host.
    pub fn with_api_base(
        config: &CloudinaryConfig,
        max_size: u64,
        api_base: &str,
    ) -> Result<Self, StorageError> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(StorageError::Config(
                "cloud_name, api_key and api_secret are required".into(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            max_size,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{action}",
            self.api_base, self.cloud_name
        )
    }

    /// Sign request parameters. `file`, `api_key` and the algorithm marker are never signed.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let payload = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        sha256_hex(format!("{payload}{}", self.api_secret))
    }

    async fn remote_error(res: reqwest::Response) -> StorageError {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        StorageError::Remote { status, message }
    }
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(
        &self,
        folder: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredImage, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }
        validate_public_id(folder)?;
        let fallback_format = image_format(content_type)?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", folder), ("timestamp", &timestamp)]);

        let file = Part::bytes(data.to_vec())
            .file_name(format!("upload.{fallback_format}"))
            .mime_str(content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("folder", folder.to_string())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let res = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::remote_error(res).await);
        }

        let body: UploadResponse = res.json().await?;
        tracing::debug!(public_id = %body.public_id, "Uploaded image to Cloudinary");

        Ok(StoredImage {
            url: body.secure_url,
            public_id: body.public_id,
            width: body.width,
            height: body.height,
            format: body
                .format
                .unwrap_or_else(|| fallback_format.to_string()),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<bool, StorageError> {
        validate_public_id(public_id)?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let res = self
            .client
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::remote_error(res).await);
        }

        let body: DestroyResponse = res.json().await?;
        match body.result.as_str() {
            "ok" => Ok(true),
            "not found" => Ok(false),
            other => Err(StorageError::Remote {
                status: 200,
                message: format!("unexpected destroy result: {other}"),
            }),
        }
    }
}
