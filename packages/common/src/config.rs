use std::path::PathBuf;

use serde::Deserialize;

/// Which image host receives uploads.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackend {
    /// Store images under a local directory and serve them from `public_url`.
    #[default]
    Filesystem,
    /// Proxy uploads to Cloudinary.
    Cloudinary,
}

/// Local directory image store settings.
#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemConfig {
    /// Directory that uploaded images are written to. Default: "./data/uploads".
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    /// URL prefix under which `dir` is served. Default: "http://localhost:5000/uploads".
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

/// Cloudinary credentials.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CloudinaryConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
}

/// App-level upload configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default)]
    pub backend: ImageBackend,
    /// Maximum size of a single image in bytes. Default: 5 MiB.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Maximum number of images in one multi-upload request. Default: 10.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Folder (public id prefix) for blog images. Default: "blog-images".
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./data/uploads")
}
fn default_public_url() -> String {
    "http://localhost:5000/uploads".into()
}
fn default_max_file_size() -> usize {
    5 * 1024 * 1024
}
fn default_max_files() -> usize {
    10
}
fn default_folder() -> String {
    "blog-images".into()
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            public_url: default_public_url(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            backend: ImageBackend::default(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
            folder: default_folder(),
            filesystem: FilesystemConfig::default(),
            cloudinary: CloudinaryConfig::default(),
        }
    }
}

impl UploadConfig {
    /// Upper bound for a multipart request body carrying `max_files` images.
    pub fn max_request_size(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_files)
            .saturating_add(1024 * 1024)
    }
}
