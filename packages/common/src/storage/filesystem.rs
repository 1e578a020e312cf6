use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{IMAGE_FORMATS, ImageStore, StoredImage, image_format, validate_public_id};

/// Filesystem-backed image store.
///
/// Every upload gets its own id: `{base_path}/{folder}/{uuid}.{format}`,
/// and `public_url` is expected to serve `base_path`.
pub struct FilesystemImageStore {
    base_path: PathBuf,
    public_url: String,
    max_size: u64,
}

impl FilesystemImageStore {
    /// Create a new filesystem image store.
    pub async fn new(
        base_path: PathBuf,
        public_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    /// Directory the store writes into.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
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
        let format = image_format(content_type)?;

        let name = uuid::Uuid::now_v7().simple().to_string();
        let file_name = format!("{name}.{format}");
        let dir = self.base_path.join(folder);
        let image_path = dir.join(&file_name);

        fs::create_dir_all(&dir).await?;
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &image_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        tracing::debug!(path = %image_path.display(), "Stored image");

        Ok(StoredImage {
            url: format!("{}/{folder}/{file_name}", self.public_url),
            public_id: format!("{folder}/{name}"),
            width: None,
            height: None,
            format: format.to_string(),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<bool, StorageError> {
        validate_public_id(public_id)?;

        let (dir, name) = match public_id.rsplit_once('/') {
            Some((folder, name)) => (self.base_path.join(folder), name),
            None => (self.base_path.clone(), public_id),
        };

        for format in IMAGE_FORMATS {
            match fs::remove_file(dir.join(format!("{name}.{format}"))).await {
                Ok(()) => return Ok(true),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(false)
    }
}
