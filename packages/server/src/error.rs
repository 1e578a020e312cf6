use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Failure envelope returned by all endpoints.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Always `false`.
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `TOKEN_EXPIRED`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`,
    /// `NOT_FOUND`, `CONFLICT`, `EMAIL_TAKEN`, `UPLOAD_FAILED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 5-200 characters")]
    pub message: String,
    /// Always `null`.
    #[schema(value_type = Option<Object>)]
    pub data: Option<()>,
    /// HTTP status code, repeated in the body.
    #[schema(example = 400)]
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    TokenExpired,
    /// Token is valid but its user no longer exists.
    UserGone,
    InvalidCredentials,
    PermissionDenied,
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    EmailTaken,
    /// The image host failed or rejected the request.
    Upload(String),
    Internal(String),
}

impl AppError {
    fn status_and_parts(self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Not authorized, no token".into(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid token".into(),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Token expired".into(),
            ),
            AppError::UserGone => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "User not found".into(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".into(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "User already exists".into(),
            ),
            AppError::Upload(detail) => {
                tracing::warn!("Image host error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "UPLOAD_FAILED",
                    "Image host request failed".into(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".into(),
                )
            }
        }
    }

    /// Render this error as the failure envelope.
    pub fn into_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = self.status_and_parts();
        (
            status,
            ErrorBody {
                success: false,
                code,
                message,
                data: None,
                status_code: status.as_u16(),
                timestamp: Utc::now(),
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("Image exceeds the {limit} byte limit"))
            }
            StorageError::UnsupportedType(_) => {
                AppError::Validation("Only image files are allowed".into())
            }
            StorageError::InvalidPublicId(id) => {
                AppError::Validation(format!("Invalid image id '{id}'"))
            }
            StorageError::Config(detail) => AppError::Internal(detail),
            other => AppError::Upload(other.to_string()),
        }
    }
}
