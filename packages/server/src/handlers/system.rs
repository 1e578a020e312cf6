use axum::http::{Method, Uri};
use serde::Serialize;

use crate::error::AppError;
use crate::response::ApiResponse;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ServiceInfo {
    #[schema(example = "Blog Management System API")]
    pub name: &'static str,
    pub version: &'static str,
    /// Location of the interactive API docs.
    #[schema(example = "/swagger-ui")]
    pub docs: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    operation_id = "healthCheck",
    summary = "Liveness probe",
    responses((status = 200, description = "Server is running", body = ApiResponse<HealthStatus>)),
)]
pub async fn health() -> ApiResponse<HealthStatus> {
    ApiResponse::ok(
        "Server is running",
        HealthStatus {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// `GET /` banner. Mounted outside the OpenAPI router.
pub async fn root() -> ApiResponse<ServiceInfo> {
    ApiResponse::ok(
        "Blog Management System API",
        ServiceInfo {
            name: "Blog Management System API",
            version: env!("CARGO_PKG_VERSION"),
            docs: "/swagger-ui",
        },
    )
}

/// JSON 404 for unmatched routes.
pub async fn fallback(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {method} {} not found", uri.path()))
}
