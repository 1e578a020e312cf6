use axum::extract::State;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog, like, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppPath, AppQuery};
use crate::models::like::*;
use crate::models::shared::{PageQuery, Pagination, UserSummary, offset};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::utils::blog::{find_blog, toggle_like as toggle_blog_like};

#[utoipa::path(
    post,
    path = "/blog/{blog_id}",
    tag = "Likes",
    operation_id = "toggleLike",
    summary = "Like or unlike a blog",
    description = "Toggles the caller's like on a published blog. The returned `likeCount` is committed together with the like row.",
    params(("blog_id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Like toggled", body = ApiResponse<ToggleLikeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Blog is not published (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(blog_id, user_id = auth_user.user_id))]
pub async fn toggle_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(blog_id): AppPath<i32>,
) -> Result<ApiResponse<ToggleLikeResponse>, AppError> {
    let result = toggle_blog_like(&state.db, blog_id, auth_user.user_id).await?;
    let message = if result.liked {
        "Blog liked successfully"
    } else {
        "Blog unliked successfully"
    };
    Ok(ApiResponse::ok(message, result))
}

#[utoipa::path(
    get,
    path = "/blog/{blog_id}/status",
    tag = "Likes",
    operation_id = "getLikeStatus",
    summary = "Whether the caller likes a blog",
    params(("blog_id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Like status", body = ApiResponse<LikeStatusResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(blog_id, user_id = auth_user.user_id))]
pub async fn like_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(blog_id): AppPath<i32>,
) -> Result<ApiResponse<LikeStatusResponse>, AppError> {
    let existing = like::Entity::find_by_id((blog_id, auth_user.user_id))
        .one(&state.db)
        .await?;

    Ok(ApiResponse::ok(
        "Like status retrieved",
        LikeStatusResponse {
            liked: existing.is_some(),
            liked_at: existing.map(|l| l.created_at),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/blog/{blog_id}/count",
    tag = "Likes",
    operation_id = "getLikeCount",
    summary = "Count likes on a blog",
    description = "Counts like rows directly rather than reading the blog's counter.",
    params(("blog_id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Like count", body = ApiResponse<LikeCountResponse>),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(blog_id))]
pub async fn like_count(
    State(state): State<AppState>,
    AppPath(blog_id): AppPath<i32>,
) -> Result<ApiResponse<LikeCountResponse>, AppError> {
    find_blog(&state.db, blog_id).await?;

    let like_count = like::Entity::find()
        .filter(like::Column::BlogId.eq(blog_id))
        .count(&state.db)
        .await?;

    Ok(ApiResponse::ok(
        "Like count retrieved",
        LikeCountResponse { like_count },
    ))
}

#[utoipa::path(
    get,
    path = "/blog/{blog_id}/users",
    tag = "Likes",
    operation_id = "listLikedUsers",
    summary = "List users who liked a blog",
    description = "Most recent likers first.",
    params(("blog_id" = i32, Path, description = "Blog ID"), PageQuery),
    responses(
        (status = 200, description = "Likers", body = ApiResponse<LikedUsersResponse>),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(blog_id))]
pub async fn liked_users(
    State(state): State<AppState>,
    AppPath(blog_id): AppPath<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<LikedUsersResponse>, AppError> {
    find_blog(&state.db, blog_id).await?;
    let (page, limit) = query.resolve();

    let select = like::Entity::find().filter(like::Column::BlogId.eq(blog_id));
    let total = select.clone().count(&state.db).await?;

    let rows = select
        .find_also_related(user::Entity)
        .order_by_desc(like::Column::CreatedAt)
        .offset(Some(offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let users = rows
        .into_iter()
        .filter_map(|(_, u)| u.map(UserSummary::from))
        .collect();

    Ok(ApiResponse::ok(
        "Liked users retrieved",
        LikedUsersResponse {
            users,
            pagination: Pagination::new(page, limit, total),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/my-likes",
    tag = "Likes",
    operation_id = "listMyLikes",
    summary = "List blogs the caller liked",
    description = "Most recent likes first, with a summary of each blog.",
    params(PageQuery),
    responses(
        (status = 200, description = "Liked blogs", body = ApiResponse<MyLikesResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn my_likes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<MyLikesResponse>, AppError> {
    let (page, limit) = query.resolve();

    let select = like::Entity::find().filter(like::Column::UserId.eq(auth_user.user_id));
    let total = select.clone().count(&state.db).await?;

    let rows = select
        .find_also_related(blog::Entity)
        .order_by_desc(like::Column::CreatedAt)
        .offset(Some(offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let mut author_ids: Vec<i32> = rows
        .iter()
        .filter_map(|(_, b)| b.as_ref().map(|b| b.author_id))
        .collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: std::collections::HashMap<i32, String> = if author_ids.is_empty() {
        Default::default()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect()
    };

    let likes = rows
        .into_iter()
        .filter_map(|(l, b)| {
            let b = b?;
            Some(MyLikeItem {
                liked_at: l.created_at,
                blog: LikedBlog {
                    id: b.id,
                    title: b.title,
                    excerpt: b.excerpt,
                    cover_image: b.cover_image,
                    like_count: b.like_count,
                    comment_count: b.comment_count,
                    author: authors.get(&b.author_id).cloned(),
                },
            })
        })
        .collect();

    Ok(ApiResponse::ok(
        "My likes retrieved successfully",
        MyLikesResponse {
            likes,
            pagination: Pagination::new(page, limit, total),
        },
    ))
}
