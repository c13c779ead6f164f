use crate::domain_port::{MediaError, MediaStore};
use crate::logger::*;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// e.g. "https://api.cloudinary.com/v1_1"
    pub api_base: String,
    pub cloud_name: String,
    pub upload_preset: String,
}

/// Unsigned upload client for the Cloudinary image API. The public id is
/// derived from the content hash, so re-uploading the same bytes lands on
/// the same asset instead of piling up duplicates.
pub struct CloudinaryMediaStore {
    client: Client,
    cfg: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryMediaStore {
    pub fn new(cfg: CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.cfg.api_base.trim_end_matches('/'),
            self.cfg.cloud_name
        )
    }

    fn public_id(bytes: &[u8]) -> String {
        let digest = hex::encode(Sha256::digest(bytes));
        digest[..20].to_string()
    }
}

#[async_trait::async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, MediaError> {
        let public_id = Self::public_id(&bytes);
        let part = Part::bytes(bytes)
            .file_name("upload")
            .mime_str(content_type)
            .map_err(|e| MediaError::Transport(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.cfg.upload_preset.clone())
            .text("public_id", public_id.clone());

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Error bodies look like {"error": {"message": "..."}}.
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| Some(v.get("error")?.get("message")?.as_str()?.to_string()))
                .unwrap_or(body);
            warn!(%status, public_id, "media host rejected upload");
            return Err(MediaError::Rejected(format!("{status}: {detail}")));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;
        info!(public_id, url = %parsed.secure_url, "image uploaded");

        Ok(parsed.secure_url)
    }
}
