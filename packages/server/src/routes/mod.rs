use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{admin, auth, blog, comment, dashboard, like, system, upload};
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/blogs", blog_routes())
        .nest("/comments", comment_routes())
        .nest("/likes", like_routes())
        .nest("/upload", upload_routes(config))
        .nest("/dashboard", dashboard_routes())
        .nest("/admin", admin_routes())
        .routes(routes!(system::health))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::me))
        .routes(routes!(auth::update_profile))
        .routes(routes!(auth::request_upgrade))
        .routes(routes!(auth::become_writer))
}

fn blog_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(blog::list_blogs, blog::create_blog))
        .routes(routes!(blog::search_blogs))
        .routes(routes!(blog::my_blogs))
        .routes(routes!(blog::blog_stats))
        .routes(routes!(blog::get_blog, blog::update_blog, blog::delete_blog))
        .routes(routes!(blog::toggle_like))
        .routes(routes!(blog::toggle_publish))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comment::list_blog_comments, comment::create_comment))
        .routes(routes!(comment::my_comments))
        .routes(routes!(
            comment::get_comment,
            comment::update_comment,
            comment::delete_comment
        ))
}

fn like_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(like::toggle_like))
        .routes(routes!(like::like_status))
        .routes(routes!(like::like_count))
        .routes(routes!(like::liked_users))
        .routes(routes!(like::my_likes))
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(upload::upload_single))
        .routes(routes!(upload::upload_multiple))
        .routes(routes!(upload::delete_image))
        .layer(DefaultBodyLimit::max(config.upload.max_request_size()))
}

fn dashboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(dashboard::dashboard_stats))
        .routes(routes!(dashboard::blog_analytics))
        .routes(routes!(dashboard::monthly_stats))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(admin::platform_stats))
        .routes(routes!(admin::list_users))
        .routes(routes!(admin::update_user_role))
        .routes(routes!(admin::list_upgrade_requests))
        .routes(routes!(admin::review_upgrade_request))
}
