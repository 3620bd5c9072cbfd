use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::clients::photo_store::{PhotoStore, PhotoStoreError, StoredPhoto};
use crate::config::PhotoStoreConfig;

/// Cloudinary-backed photo store using signed uploads (sha256 signatures).
pub struct CloudinaryStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Debug, serde::Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

impl CloudinaryStore {
    pub fn new(config: &PhotoStoreConfig) -> Result<Self, PhotoStoreError> {
        if config.cloudinary_cloud_name.is_empty() {
            return Err(PhotoStoreError::Config(
                "cloudinary_cloud_name is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Rollcall/1.0")
            .build()
            .map_err(|e| PhotoStoreError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            cloud_name: config.cloudinary_cloud_name.clone(),
            api_key: config.cloudinary_api_key.clone(),
            api_secret: config.cloudinary_api_secret.clone(),
            folder: config.upload_folder.clone(),
        })
    }

    /// Signature over the alphabetically sorted request params plus the API
    /// secret, as required by the upload API.
    fn sign(&self, params_to_sign: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(params_to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{action}",
            self.cloud_name
        )
    }
}

#[async_trait::async_trait]
impl PhotoStore for CloudinaryStore {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<StoredPhoto, PhotoStoreError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&format!(
            "folder={}&signature_algorithm=sha256&timestamp={timestamp}",
            self.folder
        ));

        let file_part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        debug!(filename, "Uploading photo to Cloudinary");

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PhotoStoreError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PhotoStoreError::Upload(format!("HTTP {status}: {body}")));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| PhotoStoreError::Upload(format!("Malformed upload response: {e}")))?;

        info!(public_id = %uploaded.public_id, "Photo uploaded");

        Ok(StoredPhoto {
            url: uploaded.secure_url,
            handle: uploaded.public_id,
        })
    }

    async fn delete(&self, handle: &str) -> Result<(), PhotoStoreError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&format!(
            "public_id={handle}&signature_algorithm=sha256&timestamp={timestamp}"
        ));

        let form = reqwest::multipart::Form::new()
            .text("public_id", handle.to_string())
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PhotoStoreError::Delete(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PhotoStoreError::Delete(format!("HTTP {status}")));
        }

        info!(public_id = %handle, "Photo deleted");
        Ok(())
    }
}
