mod error;
mod hash;
mod traits;

pub mod cloudinary;
pub mod filesystem;

use std::sync::Arc;

pub use error::StorageError;
pub use hash::sha256_hex;
pub use traits::{ImageStore, StoredImage, image_format, validate_public_id};

use crate::config::{ImageBackend, UploadConfig};

/// Build the image store selected by `config.backend`.
pub async fn build_image_store(config: &UploadConfig) -> Result<Arc<dyn ImageStore>, StorageError> {
    let max_size = config.max_file_size as u64;
    let store: Arc<dyn ImageStore> = match config.backend {
        ImageBackend::Filesystem => Arc::new(
            filesystem::FilesystemImageStore::new(
                config.filesystem.dir.clone(),
                config.filesystem.public_url.clone(),
                max_size,
            )
            .await?,
        ),
        ImageBackend::Cloudinary => Arc::new(cloudinary::CloudinaryImageStore::new(
            &config.cloudinary,
            max_size,
        )?),
    };
    Ok(store)
}
