use std::collections::HashMap;

use sea_orm::*;

use crate::entity::{BlogStatus, blog, blog_tag, like, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::blog::BlogResponse;
use crate::models::like::ToggleLikeResponse;
use crate::models::shared::UserSummary;
use crate::utils::counters;

/// Look up a blog by ID, returning 404 if not found.
pub async fn find_blog<C: ConnectionTrait>(db: &C, id: i32) -> Result<blog::Model, AppError> {
    blog::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))
}

/// 403 unless the caller wrote `blog`. `action` fills "Not authorized to {action} this blog".
pub fn require_owner(auth_user: &AuthUser, blog: &blog::Model, action: &str) -> Result<(), AppError> {
    if blog.author_id != auth_user.user_id {
        return Err(AppError::Forbidden(format!(
            "Not authorized to {action} this blog"
        )));
    }
    Ok(())
}

/// Tags of each blog, in their stored order.
pub async fn load_tags<C: ConnectionTrait>(
    db: &C,
    blog_ids: &[i32],
) -> Result<HashMap<i32, Vec<String>>, DbErr> {
    let mut out: HashMap<i32, Vec<String>> = HashMap::new();
    if blog_ids.is_empty() {
        return Ok(out);
    }
    let rows = blog_tag::Entity::find()
        .filter(blog_tag::Column::BlogId.is_in(blog_ids.iter().copied()))
        .order_by_asc(blog_tag::Column::BlogId)
        .order_by_asc(blog_tag::Column::Position)
        .all(db)
        .await?;
    for row in rows {
        out.entry(row.blog_id).or_default().push(row.tag);
    }
    Ok(out)
}

pub async fn load_user_summaries<C: ConnectionTrait>(
    db: &C,
    user_ids: &[i32],
) -> Result<HashMap<i32, UserSummary>, DbErr> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids.iter().copied()))
        .all(db)
        .await?;
    Ok(users
        .into_iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect())
}

/// Attach tags and author to each blog, preserving order.
pub async fn blog_responses<C: ConnectionTrait>(
    db: &C,
    blogs: Vec<blog::Model>,
) -> Result<Vec<BlogResponse>, DbErr> {
    let ids: Vec<i32> = blogs.iter().map(|b| b.id).collect();
    let mut author_ids: Vec<i32> = blogs.iter().map(|b| b.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let mut tags = load_tags(db, &ids).await?;
    let authors = load_user_summaries(db, &author_ids).await?;

    Ok(blogs
        .into_iter()
        .map(|b| {
            let author = authors.get(&b.author_id).cloned().unwrap_or(UserSummary {
                id: b.author_id,
                name: String::new(),
                email: String::new(),
            });
            let tags = tags.remove(&b.id).unwrap_or_default();
            BlogResponse::new(b, tags, author)
        })
        .collect())
}

pub async fn blog_response<C: ConnectionTrait>(
    db: &C,
    blog: blog::Model,
) -> Result<BlogResponse, AppError> {
    blog_responses(db, vec![blog])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("blog response assembly produced no row".into()))
}

/// Replace a blog's tag set. Callers pass tags already normalized.
pub async fn replace_tags<C: ConnectionTrait>(
    txn: &C,
    blog_id: i32,
    tags: &[String],
) -> Result<(), DbErr> {
    blog_tag::Entity::delete_many()
        .filter(blog_tag::Column::BlogId.eq(blog_id))
        .exec(txn)
        .await?;

    if tags.is_empty() {
        return Ok(());
    }

    let rows = tags.iter().enumerate().map(|(i, tag)| blog_tag::ActiveModel {
        blog_id: Set(blog_id),
        tag: Set(tag.clone()),
        position: Set(i as i32),
    });
    blog_tag::Entity::insert_many(rows).exec(txn).await?;
    Ok(())
}

/// Like the blog if the user has not, unlike it otherwise.
///
/// Runs in one transaction with the blog row locked, so the returned
/// `like_count` is exactly the number of like rows at commit.
pub async fn toggle_like(
    db: &DatabaseConnection,
    blog_id: i32,
    user_id: i32,
) -> Result<ToggleLikeResponse, AppError> {
    let txn = db.begin().await?;

    let blog = counters::lock_blog(&txn, blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;

    if blog.status != BlogStatus::Published {
        return Err(AppError::Forbidden("Cannot like unpublished blog".into()));
    }

    let existing = like::Entity::find_by_id((blog_id, user_id)).one(&txn).await?;

    let (liked, delta) = if existing.is_some() {
        like::Entity::delete_by_id((blog_id, user_id))
            .exec(&txn)
            .await?;
        (false, -1)
    } else {
        like::ActiveModel {
            blog_id: Set(blog_id),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&txn)
        .await?;
        (true, 1)
    };

    let updated = counters::adjust_like_count(&txn, blog_id, delta)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".into()))?;

    txn.commit().await?;

    tracing::debug!(blog_id, user_id, liked, like_count = updated.like_count, "Like toggled");

    Ok(ToggleLikeResponse {
        liked,
        like_count: updated.like_count,
    })
}

/// Summed views, likes and comments over a writer's blogs.
pub async fn engagement_totals<C: ConnectionTrait>(
    db: &C,
    author_id: i32,
) -> Result<(i64, i64, i64), DbErr> {
    let sums: Option<(Option<i64>, Option<i64>, Option<i64>)> = blog::Entity::find()
        .filter(blog::Column::AuthorId.eq(author_id))
        .select_only()
        .column_as(blog::Column::Views.sum(), "total_views")
        .column_as(blog::Column::LikeCount.sum(), "total_likes")
        .column_as(blog::Column::CommentCount.sum(), "total_comments")
        .into_tuple()
        .one(db)
        .await?;
    let (views, likes, comments) = sums.unwrap_or_default();
    Ok((
        views.unwrap_or(0),
        likes.unwrap_or(0),
        comments.unwrap_or(0),
    ))
}

/// Number of a writer's blogs in `status`.
pub async fn count_by_status<C: ConnectionTrait>(
    db: &C,
    author_id: i32,
    status: BlogStatus,
) -> Result<u64, DbErr> {
    blog::Entity::find()
        .filter(blog::Column::AuthorId.eq(author_id))
        .filter(blog::Column::Status.eq(status))
        .count(db)
        .await
}
