use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Success envelope returned by all endpoints.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Always `true`.
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Blog retrieved successfully")]
    pub message: String,
    pub data: Option<T>,
    /// HTTP status code, repeated in the body.
    #[schema(example = 200)]
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

/// Placeholder payload type for responses that carry only a message.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Empty {}

impl<T: Serialize> ApiResponse<T> {
    fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            status_code: status.as_u16(),
            timestamp: Utc::now(),
        }
    }

    /// 200 with data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    /// 201 with data.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }
}

impl ApiResponse<Empty> {
    /// 200 with `data: null`.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
