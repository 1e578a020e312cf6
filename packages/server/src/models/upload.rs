use common::storage::StoredImage;
use serde::Serialize;

/// An image stored on the configured image host.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    #[schema(example = "https://res.cloudinary.com/demo/image/upload/blog-images/abc.jpg")]
    pub url: String,
    /// Identifier to pass to `DELETE /api/upload/{publicId}`.
    #[schema(example = "blog-images/abc")]
    pub public_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[schema(example = "jpg")]
    pub format: String,
}

impl From<StoredImage> for UploadedImage {
    fn from(img: StoredImage) -> Self {
        Self {
            url: img.url,
            public_id: img.public_id,
            width: img.width,
            height: img.height,
            format: img.format,
        }
    }
}
