use async_trait::async_trait;
use serde::Serialize;

use super::error::StorageError;

/// An image accepted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    /// Publicly reachable URL of the image.
    pub url: String,
    /// Host-side identifier used to delete the image later.
    pub public_id: String,
    /// Pixel width, when the host reports it.
    pub width: Option<u32>,
    /// Pixel height, when the host reports it.
    pub height: Option<u32>,
    /// File format, e.g. "png".
    pub format: String,
}

/// Third-party or local host for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store one image under `folder` and return where it ended up.
    async fn upload(
        &self,
        folder: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredImage, StorageError>;

    /// Upload several images, failing as a whole if any upload fails.
    async fn upload_many(
        &self,
        folder: &str,
        images: &[(Vec<u8>, String)],
    ) -> Result<Vec<StoredImage>, StorageError> {
        let mut stored = Vec::with_capacity(images.len());
        for (data, content_type) in images {
            stored.push(self.upload(folder, data, content_type).await?);
        }
        Ok(stored)
    }

    /// Delete an image by public id.
    ///
    /// Returns `true` if the image was deleted, `false` if it did not exist.
    async fn delete(&self, public_id: &str) -> Result<bool, StorageError>;
}

/// Raster formats accepted for upload. SVG and other scriptable types are not.
pub const IMAGE_FORMATS: &[&str] = &["jpg", "png", "gif", "webp", "avif", "bmp"];

/// Map an `image/*` content type to a file format / extension.
pub fn image_format(content_type: &str) -> Result<&'static str, StorageError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let subtype = essence
        .strip_prefix("image/")
        .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))?;

    let format = match subtype {
        "jpeg" | "pjpeg" | "jpg" => "jpg",
        "x-ms-bmp" => "bmp",
        other => other,
    };
    IMAGE_FORMATS
        .iter()
        .copied()
        .find(|f| *f == format)
        .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))
}

/// Check that a public id is a relative `segment/segment` path of safe characters.
pub fn validate_public_id(public_id: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidPublicId(public_id.to_string());
    if public_id.is_empty() || public_id.len() > 255 {
        return Err(invalid());
    }
    for segment in public_id.split('/') {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid());
        }
    }
    Ok(())
}
