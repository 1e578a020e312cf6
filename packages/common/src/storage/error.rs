use thiserror::Error;

/// Errors that can occur while talking to an image host.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The public id is malformed or escapes the store's namespace.
    #[error("invalid public id: {0}")]
    InvalidPublicId(String),
    /// The image exceeds the configured size limit.
    #[error("image exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The content type is not an image type.
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),
    /// The store is misconfigured (missing credentials, bad URL).
    #[error("image store misconfigured: {0}")]
    Config(String),
    /// The remote host rejected the request.
    #[error("image host returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("image host request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}
