use axum::{extract::State, response::IntoResponse};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{BlogStatus, blog, blog_tag, comment, like, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath, AppQuery};
use crate::models::blog::*;
use crate::models::like::ToggleLikeResponse;
use crate::models::shared::{Pagination, escape_like, offset, resolve_page, split_csv};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::utils::blog::{
    blog_response, blog_responses, count_by_status, engagement_totals, find_blog, replace_tags,
    require_owner, toggle_like as toggle_blog_like,
};
use crate::utils::counters;

/// Case-insensitive substring match of `term` against any of `columns`.
fn text_match(columns: &[blog::Column], term: &str) -> Option<Condition> {
    let term = escape_like(term.trim());
    if term.is_empty() {
        return None;
    }
    let pattern = format!("%{}%", term.to_lowercase());
    let cond = columns.iter().fold(Condition::any(), |cond, col| {
        cond.add(
            Expr::expr(Func::lower(Expr::col(*col)))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    });
    Some(cond)
}

/// Blogs carrying any of the comma-separated `tags`.
fn tag_filter(raw: &str) -> Option<Condition> {
    let tags = split_csv(raw);
    if tags.is_empty() {
        return None;
    }
    Some(Condition::all().add(
        blog::Column::Id.in_subquery(
            SeaQuery::select()
                .column(blog_tag::Column::BlogId)
                .from(blog_tag::Entity)
                .and_where(blog_tag::Column::Tag.is_in(tags))
                .to_owned(),
        ),
    ))
}

async fn paginate(
    db: &DatabaseConnection,
    select: Select<blog::Entity>,
    page: u64,
    limit: u64,
) -> Result<BlogListResponse, AppError> {
    let total = select.clone().count(db).await?;
    let blogs = select
        .offset(Some(offset(page, limit)))
        .limit(Some(limit))
        .all(db)
        .await?;

    Ok(BlogListResponse {
        blogs: blog_responses(db, blogs).await?,
        pagination: Pagination::new(page, limit, total),
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Blogs",
    operation_id = "listBlogs",
    summary = "List published blogs",
    description = "Published blogs, newest first. `tags` matches blogs with any of the listed tags; `search` is a case-insensitive substring of title or content.",
    params(BlogListQuery),
    responses(
        (status = 200, description = "Blogs retrieved", body = ApiResponse<BlogListResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_blogs(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BlogListQuery>,
) -> Result<ApiResponse<BlogListResponse>, AppError> {
    let (page, limit) = resolve_page(query.page, query.limit);

    let mut select = blog::Entity::find().filter(blog::Column::Status.eq(BlogStatus::Published));

    if let Some(filter) = query.tags.as_deref().and_then(tag_filter) {
        select = select.filter(filter);
    }
    if let Some(cond) = query.search.as_deref().and_then(|s| {
        text_match(&[blog::Column::Title, blog::Column::Content], s)
    }) {
        select = select.filter(cond);
    }

    let select = select
        .order_by_desc(blog::Column::CreatedAt)
        .order_by_desc(blog::Column::Id);

    let data = paginate(&state.db, select, page, limit).await?;
    Ok(ApiResponse::ok("Blogs retrieved successfully", data))
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "Blogs",
    operation_id = "searchBlogs",
    summary = "Search published blogs",
    description = "Filters by text (`q` over title, content and excerpt), tags (any-match) and author name, sorted by `sortBy`: `recent` (default), `popular` (views), `likes` or `comments`.",
    params(BlogSearchQuery),
    responses(
        (status = 200, description = "Search results", body = ApiResponse<BlogListResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn search_blogs(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BlogSearchQuery>,
) -> Result<ApiResponse<BlogListResponse>, AppError> {
    let (page, limit) = resolve_page(query.page, query.limit);
    let sort = SearchSort::parse(query.sort_by.as_deref());

    let mut select = blog::Entity::find().filter(blog::Column::Status.eq(BlogStatus::Published));

    if let Some(cond) = query.q.as_deref().and_then(|q| {
        text_match(
            &[blog::Column::Title, blog::Column::Content, blog::Column::Excerpt],
            q,
        )
    }) {
        select = select.filter(cond);
    }
    if let Some(filter) = query.tags.as_deref().and_then(tag_filter) {
        select = select.filter(filter);
    }
    if let Some(author) = query.author.as_deref() {
        let term = escape_like(author.trim());
        if !term.is_empty() {
            select = select.filter(
                blog::Column::AuthorId.in_subquery(
                    SeaQuery::select()
                        .column(user::Column::Id)
                        .from(user::Entity)
                        .and_where(
                            Expr::expr(Func::lower(Expr::col(user::Column::Name))).like(
                                LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\'),
                            ),
                        )
                        .to_owned(),
                ),
            );
        }
    }

    let mut select = select.order_by_desc(sort.column());
    if sort != SearchSort::Recent {
        select = select.order_by_desc(blog::Column::CreatedAt);
    }
    let select = select.order_by_desc(blog::Column::Id);

    let data = paginate(&state.db, select, page, limit).await?;
    Ok(ApiResponse::ok("Blogs search results", data))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "getBlog",
    summary = "Get a blog by ID",
    description = "Returns a blog and counts one view. Drafts are only visible to their author; other callers get 404. Authentication is optional and only affects `userLiked` and draft visibility.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog retrieved", body = ApiResponse<BlogDetailResponse>),
        (status = 400, description = "Invalid ID format (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_blog(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<BlogDetailResponse>, AppError> {
    let existing = find_blog(&state.db, id).await?;
    let viewer = auth_user.as_ref().map(|u| u.user_id);
    if existing.status != BlogStatus::Published && viewer != Some(existing.author_id) {
        return Err(AppError::NotFound("Blog not found".into()));
    }

    let blog = counters::record_view(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;

    let user_liked = match viewer {
        Some(user_id) => like::Entity::find_by_id((id, user_id))
            .one(&state.db)
            .await?
            .is_some(),
        None => false,
    };

    Ok(ApiResponse::ok(
        "Blog retrieved successfully",
        BlogDetailResponse {
            blog: blog_response(&state.db, blog).await?,
            user_liked,
        },
    ))
}

#[utoipa::path(
    post,
    path = "/{id}/like",
    tag = "Blogs",
    operation_id = "toggleBlogLike",
    summary = "Like or unlike a blog",
    description = "Toggles the caller's like on a published blog and returns the new state with the committed like count.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Like toggled", body = ApiResponse<ToggleLikeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Blog is not published (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn toggle_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<ToggleLikeResponse>, AppError> {
    let result = toggle_blog_like(&state.db, id, auth_user.user_id).await?;
    let message = if result.liked {
        "Blog liked successfully"
    } else {
        "Blog unliked successfully"
    };
    Ok(ApiResponse::ok(message, result))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Blogs",
    operation_id = "createBlog",
    summary = "Create a blog",
    description = "Creates a blog owned by the caller. Requires the writer role. The excerpt is derived from the content.",
    request_body = CreateBlogRequest,
    responses(
        (status = 201, description = "Blog created", body = ApiResponse<BlogResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_writer()?;
    validate_create_blog(&payload)?;
    let tags = normalize_tags(&payload.tags)?;
    let cover_image = normalize_cover_image(payload.cover_image.as_deref())?;

    let now = chrono::Utc::now();
    let txn = state.db.begin().await?;

    let model = blog::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        excerpt: Set(make_excerpt(&payload.content)),
        content: Set(payload.content),
        cover_image: Set(cover_image),
        status: Set(payload.status.unwrap_or_default()),
        views: Set(0),
        like_count: Set(0),
        comment_count: Set(0),
        author_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_tags(&txn, model.id, &tags).await?;
    txn.commit().await?;

    tracing::info!(blog_id = model.id, author_id = auth_user.user_id, "Blog created");

    Ok(ApiResponse::created(
        "Blog created successfully",
        blog_response(&state.db, model).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/my-blogs",
    tag = "Blogs",
    operation_id = "listMyBlogs",
    summary = "List own blogs",
    description = "The caller's blogs in any state, newest first, optionally filtered by `status`. Requires the writer role.",
    params(MyBlogsQuery),
    responses(
        (status = 200, description = "Own blogs", body = ApiResponse<BlogListResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn my_blogs(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MyBlogsQuery>,
) -> Result<ApiResponse<BlogListResponse>, AppError> {
    auth_user.require_writer()?;
    let (page, limit) = resolve_page(query.page, query.limit);

    let mut select = blog::Entity::find().filter(blog::Column::AuthorId.eq(auth_user.user_id));
    if let Some(status) = query.status {
        select = select.filter(blog::Column::Status.eq(status));
    }
    let select = select
        .order_by_desc(blog::Column::CreatedAt)
        .order_by_desc(blog::Column::Id);

    let data = paginate(&state.db, select, page, limit).await?;
    Ok(ApiResponse::ok("My blogs retrieved successfully", data))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Blogs",
    operation_id = "getBlogStats",
    summary = "Own blog statistics",
    description = "Counts of the caller's blogs by status and their summed views, likes and comments. Requires the writer role.",
    responses(
        (status = 200, description = "Blog stats", body = ApiResponse<BlogStatsResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn blog_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<BlogStatsResponse>, AppError> {
    auth_user.require_writer()?;

    let published = count_by_status(&state.db, auth_user.user_id, BlogStatus::Published).await?;
    let draft = count_by_status(&state.db, auth_user.user_id, BlogStatus::Draft).await?;
    let (total_views, total_likes, total_comments) =
        engagement_totals(&state.db, auth_user.user_id).await?;

    Ok(ApiResponse::ok(
        "Blog stats retrieved",
        BlogStatsResponse {
            published,
            draft,
            total_views,
            total_likes,
            total_comments,
        },
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "updateBlog",
    summary = "Update a blog",
    description = "Partial update of the caller's own blog. Changing content re-derives the excerpt; `tags` replaces the tag list.",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Blog updated", body = ApiResponse<BlogResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer or not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateBlogRequest>,
) -> Result<ApiResponse<BlogResponse>, AppError> {
    auth_user.require_writer()?;
    validate_update_blog(&payload)?;
    let tags = payload.tags.as_deref().map(normalize_tags).transpose()?;
    let cover_image = payload
        .cover_image
        .as_ref()
        .map(|c| normalize_cover_image(c.as_deref()))
        .transpose()?;

    let txn = state.db.begin().await?;

    let existing = counters::lock_blog(&txn, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;
    require_owner(&auth_user, &existing, "update")?;

    let mut active: blog::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(content) = payload.content {
        active.excerpt = Set(make_excerpt(&content));
        active.content = Set(content);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(cover_image) = cover_image {
        active.cover_image = Set(cover_image);
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(&txn).await?;
    if let Some(ref tags) = tags {
        replace_tags(&txn, id, tags).await?;
    }
    txn.commit().await?;

    Ok(ApiResponse::ok(
        "Blog updated successfully",
        blog_response(&state.db, updated).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "deleteBlog",
    summary = "Delete a blog",
    description = "Deletes the caller's own blog together with its tags, likes and comments.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog deleted", body = ApiResponse<Empty>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer or not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Empty>, AppError> {
    auth_user.require_writer()?;

    let txn = state.db.begin().await?;

    let existing = counters::lock_blog(&txn, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;
    require_owner(&auth_user, &existing, "delete")?;

    like::Entity::delete_many()
        .filter(like::Column::BlogId.eq(id))
        .exec(&txn)
        .await?;
    comment::Entity::delete_many()
        .filter(comment::Column::BlogId.eq(id))
        .exec(&txn)
        .await?;
    blog_tag::Entity::delete_many()
        .filter(blog_tag::Column::BlogId.eq(id))
        .exec(&txn)
        .await?;
    blog::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(blog_id = id, "Blog deleted");
    Ok(ApiResponse::message("Blog deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/{id}/publish",
    tag = "Blogs",
    operation_id = "togglePublish",
    summary = "Publish or unpublish a blog",
    description = "Flips the caller's own blog between `draft` and `published`.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Status toggled", body = ApiResponse<BlogResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer or not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn toggle_publish(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<BlogResponse>, AppError> {
    auth_user.require_writer()?;

    let txn = state.db.begin().await?;
    let existing = counters::lock_blog(&txn, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;
    require_owner(&auth_user, &existing, "update")?;

    let status = existing.status.toggled();
    let mut active: blog::ActiveModel = existing.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    let message = match status {
        BlogStatus::Published => "Blog published successfully",
        BlogStatus::Draft => "Blog unpublished successfully",
    };
    Ok(ApiResponse::ok(message, blog_response(&state.db, updated).await?))
}
