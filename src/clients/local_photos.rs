use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::clients::photo_store::{PhotoStore, PhotoStoreError, StoredPhoto};

/// Filesystem photo store. Files land in a configured directory and are
/// served under /photos; the handle is the stored filename.
pub struct LocalPhotoStore {
    dir: PathBuf,
}

impl LocalPhotoStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn unique_name(filename: &str) -> String {
        use rand::Rng;

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");

        let mut rng = rand::rng();
        let tag: [u8; 8] = rng.random();
        format!("{}.{extension}", hex::encode(tag))
    }
}

#[async_trait::async_trait]
impl PhotoStore for LocalPhotoStore {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<StoredPhoto, PhotoStoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PhotoStoreError::Upload(e.to_string()))?;

        let name = Self::unique_name(filename);
        let path = self.dir.join(&name);

        fs::write(&path, bytes)
            .await
            .map_err(|e| PhotoStoreError::Upload(format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), "Photo stored locally");

        Ok(StoredPhoto {
            url: format!("/photos/{name}"),
            handle: name,
        })
    }

    async fn delete(&self, handle: &str) -> Result<(), PhotoStoreError> {
        // Reject path separators so a stored handle can't escape the dir.
        if handle.contains('/') || handle.contains('\\') {
            return Err(PhotoStoreError::Delete(format!("Invalid handle: {handle}")));
        }

        let path = self.dir.join(handle);
        fs::remove_file(&path)
            .await
            .map_err(|e| PhotoStoreError::Delete(format!("{}: {e}", path.display())))?;

        Ok(())
    }
}
