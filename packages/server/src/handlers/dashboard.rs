use axum::extract::State;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{BlogStatus, blog, comment, like, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppPath;
use crate::models::comment::CommentResponse;
use crate::models::dashboard::*;
use crate::models::shared::UserSummary;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::utils::blog::{count_by_status, engagement_totals};

/// Columns of [`BlogSummaryItem`].
fn summary_select() -> Select<blog::Entity> {
    blog::Entity::find()
        .select_only()
        .column(blog::Column::Id)
        .column(blog::Column::Title)
        .column(blog::Column::Status)
        .column(blog::Column::Views)
        .column(blog::Column::LikeCount)
        .column(blog::Column::CommentCount)
        .column(blog::Column::CreatedAt)
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Dashboard",
    operation_id = "getDashboardStats",
    summary = "Writer dashboard overview",
    description = "Totals across the caller's blogs, engagement rate, the five newest blogs and the five most-viewed published blogs. Requires the writer role.",
    responses(
        (status = 200, description = "Dashboard stats", body = ApiResponse<DashboardStatsResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn dashboard_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<DashboardStatsResponse>, AppError> {
    auth_user.require_writer()?;
    let writer_id = auth_user.user_id;

    let published = count_by_status(&state.db, writer_id, BlogStatus::Published).await?;
    let drafts = count_by_status(&state.db, writer_id, BlogStatus::Draft).await?;
    let (total_views, total_likes, total_comments) = engagement_totals(&state.db, writer_id).await?;

    let recent_blogs = summary_select()
        .filter(blog::Column::AuthorId.eq(writer_id))
        .order_by_desc(blog::Column::CreatedAt)
        .limit(5)
        .into_model::<BlogSummaryItem>()
        .all(&state.db)
        .await?;

    let top_performing_blogs = summary_select()
        .filter(blog::Column::AuthorId.eq(writer_id))
        .filter(blog::Column::Status.eq(BlogStatus::Published))
        .order_by_desc(blog::Column::Views)
        .order_by_desc(blog::Column::CreatedAt)
        .limit(5)
        .into_model::<BlogSummaryItem>()
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(
        "Dashboard stats retrieved",
        DashboardStatsResponse {
            overview: DashboardOverview {
                total_blogs: published + drafts,
                published,
                drafts,
                total_views,
                total_likes,
                total_comments,
                engagement_rate: engagement_rate(total_views, total_likes, total_comments),
            },
            recent_activity: RecentActivity {
                recent_blogs,
                top_performing_blogs,
            },
        },
    ))
}

#[utoipa::path(
    get,
    path = "/analytics/{blog_id}",
    tag = "Dashboard",
    operation_id = "getBlogAnalytics",
    summary = "Engagement detail for one of the caller's blogs",
    description = "Counters plus the ten newest comments and likes. Blogs owned by someone else are reported as not found.",
    params(("blog_id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog analytics", body = ApiResponse<BlogAnalyticsResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found or not owned (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(blog_id))]
pub async fn blog_analytics(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(blog_id): AppPath<i32>,
) -> Result<ApiResponse<BlogAnalyticsResponse>, AppError> {
    auth_user.require_writer()?;

    let blog = summary_select()
        .filter(blog::Column::Id.eq(blog_id))
        .filter(blog::Column::AuthorId.eq(auth_user.user_id))
        .into_model::<BlogSummaryItem>()
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found or access denied".into()))?;

    let comments = comment::Entity::find()
        .filter(comment::Column::BlogId.eq(blog_id))
        .find_also_related(user::Entity)
        .order_by_desc(comment::Column::CreatedAt)
        .limit(10)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(c, u)| CommentResponse::new(c, u.map(UserSummary::from), None))
        .collect();

    let recent_likes = like::Entity::find()
        .filter(like::Column::BlogId.eq(blog_id))
        .find_also_related(user::Entity)
        .order_by_desc(like::Column::CreatedAt)
        .limit(10)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(l, u)| RecentLike {
            user_id: l.user_id,
            name: u.map(|u| u.name),
            created_at: l.created_at,
        })
        .collect();

    Ok(ApiResponse::ok(
        "Blog analytics retrieved",
        BlogAnalyticsResponse {
            blog,
            engagement: BlogEngagement {
                comments,
                recent_likes,
            },
        },
    ))
}

#[utoipa::path(
    get,
    path = "/monthly-stats",
    tag = "Dashboard",
    operation_id = "getMonthlyStats",
    summary = "Per-month totals for charts",
    description = "The caller's blogs created in the last six months, grouped by (year, month) of creation, oldest first.",
    responses(
        (status = 200, description = "Monthly stats", body = ApiResponse<MonthlyStatsResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn monthly_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<MonthlyStatsResponse>, AppError> {
    auth_user.require_writer()?;

    let since = window_start(chrono::Utc::now());
    let rows = blog::Entity::find()
        .filter(blog::Column::AuthorId.eq(auth_user.user_id))
        .filter(blog::Column::CreatedAt.gte(since))
        .select_only()
        .column(blog::Column::CreatedAt)
        .column(blog::Column::Status)
        .column(blog::Column::Views)
        .column(blog::Column::LikeCount)
        .column(blog::Column::CommentCount)
        .into_model::<MonthlyRow>()
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(
        "Monthly stats retrieved",
        MonthlyStatsResponse {
            monthly_stats: group_monthly(&rows),
        },
    ))
}
