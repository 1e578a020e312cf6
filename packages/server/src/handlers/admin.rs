use std::collections::HashMap;

use axum::extract::State;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{BlogStatus, Role, UpgradeStatus, blog, comment, like, upgrade_request, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppPath, AppQuery};
use crate::models::admin::*;
use crate::models::shared::{Pagination, PublicUser, offset, resolve_page};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::utils::blog::blog_responses;

/// Blog count per author among `author_ids`, optionally restricted to published blogs.
async fn blog_counts<C: ConnectionTrait>(
    db: &C,
    author_ids: &[i32],
    published_only: bool,
) -> Result<HashMap<i32, u64>, DbErr> {
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut select = blog::Entity::find()
        .select_only()
        .column(blog::Column::AuthorId)
        .column_as(blog::Column::Id.count(), "blog_count")
        .filter(blog::Column::AuthorId.is_in(author_ids.iter().copied()))
        .group_by(blog::Column::AuthorId);
    if published_only {
        select = select.filter(blog::Column::Status.eq(BlogStatus::Published));
    }
    let rows: Vec<(i32, i64)> = select.into_tuple().all(db).await?;
    Ok(rows
        .into_iter()
        .map(|(id, n)| (id, Ord::max(n, 0) as u64))
        .collect())
}

#[utoipa::path(
    get,
    path = "/platform-stats",
    tag = "Admin",
    operation_id = "getPlatformStats",
    summary = "Platform-wide totals",
    description = "User, blog and engagement counts across the whole platform plus the five newest published blogs. Requires the writer role.",
    responses(
        (status = 200, description = "Platform stats", body = ApiResponse<PlatformStatsResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn platform_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<PlatformStatsResponse>, AppError> {
    auth_user.require_writer()?;
    let db = &state.db;

    let writers = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Writer))
        .count(db)
        .await?;
    let readers = user::Entity::find()
        .filter(user::Column::Role.eq(Role::Reader))
        .count(db)
        .await?;

    let published = blog::Entity::find()
        .filter(blog::Column::Status.eq(BlogStatus::Published))
        .count(db)
        .await?;
    let draft = blog::Entity::find()
        .filter(blog::Column::Status.eq(BlogStatus::Draft))
        .count(db)
        .await?;

    // Soft-deleted comments are still counted.
    let comments = comment::Entity::find().count(db).await?;
    let likes = like::Entity::find().count(db).await?;

    let recent = blog::Entity::find()
        .filter(blog::Column::Status.eq(BlogStatus::Published))
        .order_by_desc(blog::Column::CreatedAt)
        .limit(5)
        .all(db)
        .await?;

    Ok(ApiResponse::ok(
        "Platform stats retrieved",
        PlatformStatsResponse {
            users: UserCounts {
                total: writers + readers,
                writers,
                readers,
            },
            blogs: BlogCounts {
                total: published + draft,
                published,
                draft,
            },
            engagement: EngagementCounts { comments, likes },
            recent_activity: PlatformActivity {
                recent_blogs: blog_responses(db, recent).await?,
            },
        },
    ))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List users",
    description = "Newest accounts first, each with total and published blog counts. Requires the writer role.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = ApiResponse<AdminUserListResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<ApiResponse<AdminUserListResponse>, AppError> {
    auth_user.require_writer()?;
    let (page, limit) = resolve_page(query.page, query.limit);

    let mut select = user::Entity::find();
    if let Some(role) = query.role {
        select = select.filter(user::Column::Role.eq(role));
    }

    let total = select.clone().count(&state.db).await?;
    let users = select
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .offset(Some(offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let counts = blog_counts(&state.db, &ids, false).await?;
    let published = blog_counts(&state.db, &ids, true).await?;

    let users = users
        .into_iter()
        .map(|u| {
            let total = counts.get(&u.id).copied().unwrap_or(0);
            let published = published.get(&u.id).copied().unwrap_or(0);
            AdminUserItem::new(u, total, published)
        })
        .collect();

    Ok(ApiResponse::ok(
        "Users retrieved",
        AdminUserListResponse {
            users,
            pagination: Pagination::new(page, limit, total),
        },
    ))
}

#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    tag = "Admin",
    operation_id = "updateUserRole",
    summary = "Change a user's role",
    description = "Sets a user's role. A writer cannot demote their own account. Requires the writer role.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<PublicUser>),
        (status = 400, description = "Invalid role or self-demotion (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, role = %payload.role))]
pub async fn update_user_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    auth_user.require_writer()?;

    if id == auth_user.user_id && payload.role == Role::Reader {
        return Err(AppError::Validation(
            "Cannot change your own role to reader".into(),
        ));
    }

    let target = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut active: user::ActiveModel = target.into();
    active.role = Set(payload.role);
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&state.db).await?;

    tracing::info!(target_user = id, by = auth_user.user_id, role = %payload.role, "User role changed");

    Ok(ApiResponse::ok(
        format!("User role updated to {}", payload.role),
        PublicUser::from(updated),
    ))
}

#[utoipa::path(
    get,
    path = "/upgrade-requests",
    tag = "Admin",
    operation_id = "listUpgradeRequests",
    summary = "List writer upgrade requests",
    description = "Newest first, optionally filtered by status. Requires the writer role.",
    params(UpgradeRequestListQuery),
    responses(
        (status = 200, description = "Upgrade requests", body = ApiResponse<UpgradeRequestListResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_upgrade_requests(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UpgradeRequestListQuery>,
) -> Result<ApiResponse<UpgradeRequestListResponse>, AppError> {
    auth_user.require_writer()?;
    let (page, limit) = resolve_page(query.page, query.limit);

    let mut select = upgrade_request::Entity::find();
    if let Some(status) = query.status {
        select = select.filter(upgrade_request::Column::Status.eq(status));
    }

    let total = select.clone().count(&state.db).await?;
    let rows = select
        .find_also_related(user::Entity)
        .order_by_desc(upgrade_request::Column::CreatedAt)
        .order_by_desc(upgrade_request::Column::Id)
        .offset(Some(offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(
        "Upgrade requests retrieved",
        UpgradeRequestListResponse {
            requests: rows
                .into_iter()
                .map(|(r, u)| UpgradeRequestItem::new(r, u))
                .collect(),
            pagination: Pagination::new(page, limit, total),
        },
    ))
}

#[utoipa::path(
    patch,
    path = "/upgrade-requests/{id}",
    tag = "Admin",
    operation_id = "reviewUpgradeRequest",
    summary = "Approve or reject an upgrade request",
    description = "Records the decision on a pending request. Approval promotes the requester to writer in the same transaction. Requires the writer role.",
    params(("id" = i32, Path, description = "Upgrade request ID")),
    request_body = ReviewUpgradeRequest,
    responses(
        (status = 200, description = "Request reviewed", body = ApiResponse<UpgradeRequestItem>),
        (status = 400, description = "Invalid decision (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, TOKEN_EXPIRED)", body = ErrorBody),
        (status = 403, description = "Not a writer (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Request already reviewed (CONFLICT)", body = ErrorBody),
    ),
    security(("cookie" = []), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn review_upgrade_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<ReviewUpgradeRequest>,
) -> Result<ApiResponse<UpgradeRequestItem>, AppError> {
    auth_user.require_writer()?;
    let decision = UpgradeStatus::from(payload.status);

    let txn = state.db.begin().await?;

    let request = upgrade_request::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Upgrade request not found".into()))?;
    if request.status != UpgradeStatus::Pending {
        return Err(AppError::Conflict(
            "Upgrade request has already been reviewed".into(),
        ));
    }

    let now = chrono::Utc::now();
    let requester_id = request.user_id;
    let mut active: upgrade_request::ActiveModel = request.into();
    active.status = Set(decision);
    active.reviewed_by = Set(Some(auth_user.user_id));
    active.reviewed_at = Set(Some(now));
    let reviewed = active.update(&txn).await?;

    if decision == UpgradeStatus::Approved {
        user::Entity::update_many()
            .col_expr(user::Column::Role, Expr::value(Role::Writer))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(requester_id))
            .exec(&txn)
            .await?;
    }

    let requester = user::Entity::find_by_id(requester_id).one(&txn).await?;
    txn.commit().await?;

    tracing::info!(request_id = id, requester_id, by = auth_user.user_id, ?decision, "Upgrade request reviewed");

    let message = match decision {
        UpgradeStatus::Approved => "Upgrade request approved",
        _ => "Upgrade request rejected",
    };
    Ok(ApiResponse::ok(
        message,
        UpgradeRequestItem::new(reviewed, requester),
    ))
}
