use axum::{extract::State, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{BlogStatus, blog, comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath, AppQuery};
use crate::models::comment::*;
use crate::models::shared::{PageQuery, Pagination, UserSummary, offset};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::blog::find_blog;
use crate::utils::counters;

async fn find_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<comment::Model, AppError> {
    comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

#[utoipa::path(
    get,
    path = "/blog/{blog_id}",
    tag = "Comments",
    operation_id = "listBlogComments",
    summary = "List comments on a blog",
    description = "Active comments on a blog, newest first.",
    params(("blog_id" = i32, Path, description = "Blog ID"), PageQuery),
    responses(
        (status = 200, description = "Comments retrieved", body = ApiResponse<CommentListResponse>),
        (status = 400, description = "Invalid ID format (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(blog_id))]
pub async fn list_blog_comments(
    State(state): State<AppState>,
    AppPath(blog_id): AppPath<i32>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<CommentListResponse>, AppError> {
    find_blog(&state.db, blog_id).await?;
    let (page, limit) = query.resolve();

    let select = comment::Entity::find()
        .filter(comment::Column::BlogId.eq(blog_id))
        .filter(comment::Column::IsActive.eq(true));

    let total = select.clone().count(&state.db).await?;
    let rows = select
        .find_also_related(user::Entity)
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .offset(Some(offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let comments = rows
        .into_iter()
        .map(|(c, u)| CommentResponse::new(c, u.map(UserSummary::from), None))
        .collect();

    Ok(ApiResponse::ok(
        "Comments retrieved successfully",
        CommentListResponse {
            comments,
            pagination: Pagination::new(page, limit, total),
        },
    ))
}

#[utoipa::path(
    post,
    path = "/blog/{blog_id}",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a blog",
    description = "Adds a comment to a published blog and increments its comment count in the same transaction.",
    params(("blog_id" = i32, Path, description = "Blog ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Blog is not published (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(blog_id, user_id = auth_user.user_id))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(blog_id): AppPath<i32>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let content = validate_comment(&payload)?;

    let txn = state.db.begin().await?;

    let blog = counters::lock_blog(&txn, blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;
    if blog.status != BlogStatus::Published {
        return Err(AppError::Forbidden(
            "Cannot comment on unpublished blog".into(),
        ));
    }

    let now = chrono::Utc::now();
    let model = comment::ActiveModel {
        content: Set(content),
        is_active: Set(true),
        blog_id: Set(blog_id),
        user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    counters::adjust_comment_count(&txn, blog_id, 1).await?;
    txn.commit().await?;

    Ok(ApiResponse::created(
        "Comment added successfully",
        CommentResponse::new(model, Some(UserSummary::from(auth_user.user)), None),
    ))
}

#[utoipa::path(
    get,
    path = "/my-comments",
    tag = "Comments",
    operation_id = "listMyComments",
    summary = "List own comments",
    description = "The caller's active comments, newest first, with the title of each blog.",
    params(PageQuery),
    responses(
        (status = 200, description = "Own comments", body = ApiResponse<CommentListResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn my_comments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<CommentListResponse>, AppError> {
    let (page, limit) = query.resolve();

    let select = comment::Entity::find()
        .filter(comment::Column::UserId.eq(auth_user.user_id))
        .filter(comment::Column::IsActive.eq(true));

    let total = select.clone().count(&state.db).await?;
    let rows = select
        .find_also_related(blog::Entity)
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .offset(Some(offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let comments = rows
        .into_iter()
        .map(|(c, b)| {
            let blog = b.map(|b| BlogRef {
                id: b.id,
                title: b.title,
            });
            CommentResponse::new(c, None, blog)
        })
        .collect();

    Ok(ApiResponse::ok(
        "My comments retrieved successfully",
        CommentListResponse {
            comments,
            pagination: Pagination::new(page, limit, total),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment by ID",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment retrieved", body = ApiResponse<CommentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_comment(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let model = find_comment(&state.db, id).await?;

    let author = user::Entity::find_by_id(model.user_id)
        .one(&state.db)
        .await?
        .map(UserSummary::from);
    let blog = blog::Entity::find_by_id(model.blog_id)
        .one(&state.db)
        .await?
        .map(|b| BlogRef {
            id: b.id,
            title: b.title,
        });

    Ok(ApiResponse::ok(
        "Comment retrieved successfully",
        CommentResponse::new(model, author, blog),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit own comment",
    description = "Replaces the content of the caller's own active comment.",
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Validation error or comment deleted (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not the commenter (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let content = validate_comment(&payload)?;
    let existing = find_comment(&state.db, id).await?;

    if existing.user_id != auth_user.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to update this comment".into(),
        ));
    }
    if !existing.is_active {
        return Err(AppError::Validation("Cannot update deleted comment".into()));
    }

    let mut active: comment::ActiveModel = existing.into();
    active.content = Set(content);
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&state.db).await?;

    Ok(ApiResponse::ok(
        "Comment updated successfully",
        CommentResponse::new(updated, Some(UserSummary::from(auth_user.user)), None),
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Soft-deletes a comment (the row is kept with `isActive = false`) and decrements the blog's comment count. Allowed for the commenter and the blog's author.",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = ApiResponse<Empty>),
        (status = 400, description = "Comment already deleted (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Neither commenter nor blog author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Empty>, AppError> {
    let blog_id = find_comment(&state.db, id).await?.blog_id;

    let txn = state.db.begin().await?;

    let blog = counters::lock_blog(&txn, blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;
    // Re-read under the blog lock so a concurrent delete cannot double-decrement.
    let existing = find_comment(&txn, id).await?;

    if existing.user_id != auth_user.user_id && blog.author_id != auth_user.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to delete this comment".into(),
        ));
    }
    if !existing.is_active {
        return Err(AppError::Validation("Comment is already deleted".into()));
    }

    let mut active: comment::ActiveModel = existing.into();
    active.is_active = Set(false);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&txn).await?;

    counters::adjust_comment_count(&txn, blog_id, -1).await?;
    txn.commit().await?;

    Ok(ApiResponse::message("Comment deleted successfully"))
}
