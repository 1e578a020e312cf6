pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use common::ImageBackend;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{
    ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme,
};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;
use crate::utils::cookie::TOKEN_COOKIE;

/// Upper bound for JSON request bodies.
const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog Management System API",
        version = "1.0.0",
        description = "REST API for a multi-author blog with comments, likes and writer dashboards"
    ),
    tags(
        (name = "Auth", description = "Registration, sessions and profile"),
        (name = "Blogs", description = "Blog CRUD, search and publishing"),
        (name = "Comments", description = "Comments on published blogs"),
        (name = "Likes", description = "Blog likes"),
        (name = "Upload", description = "Image uploads for writers"),
        (name = "Dashboard", description = "Per-writer statistics"),
        (name = "Admin", description = "Platform statistics and user management"),
        (name = "System", description = "Health and service information"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(TOKEN_COOKIE))),
        );
    }
}

/// CORS for the browser client. Credentials require explicit origins, so an
/// empty list disables cross-origin access entirely.
fn cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = cors
        .allow_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
            .max_age(Duration::from_secs(cors.max_age)),
    )
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .split_for_parts();

    let upload_dir = (state.config.upload.backend == ImageBackend::Filesystem)
        .then(|| state.config.upload.filesystem.dir.clone());
    let cors = cors_layer(&state.config.server.cors);

    let mut app = router
        .route("/", get(handlers::system::root))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    if let Some(dir) = upload_dir {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app = app
        .fallback(handlers::system::fallback)
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));
    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http())
}
