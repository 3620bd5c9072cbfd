use thiserror::Error;

/// Errors from the external photo host.
#[derive(Debug, Error)]
pub enum PhotoStoreError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    #[error("Photo store misconfigured: {0}")]
    Config(String),
}

/// A stored photo: a public URL plus the handle needed to delete it later.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub url: String,
    pub handle: String,
}

/// Port to the external object store hosting student photos. Uploads must
/// succeed for a student record to exist; deletes are best-effort and the
/// callers tolerate (and log) failures.
#[async_trait::async_trait]
pub trait PhotoStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<StoredPhoto, PhotoStoreError>;

    async fn delete(&self, handle: &str) -> Result<(), PhotoStoreError>;
}
