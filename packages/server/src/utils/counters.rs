//! Denormalized blog counters.
//!
//! `like_count` and `comment_count` are only ever changed through these helpers,
//! inside the same transaction as the like/comment write and after the blog row
//! has been locked with [`lock_blog`]. `views` has no child rows and is bumped
//! with a single atomic update.

use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;

use crate::entity::blog;

/// Load a blog and take a row lock on it for the rest of the transaction.
pub async fn lock_blog<C: ConnectionTrait>(
    txn: &C,
    blog_id: i32,
) -> Result<Option<blog::Model>, DbErr> {
    blog::Entity::find_by_id(blog_id)
        .lock(LockType::Update)
        .one(txn)
        .await
}

/// Atomically add `delta` to one counter column, returning the updated row.
async fn bump<C: ConnectionTrait>(
    db: &C,
    blog_id: i32,
    column: blog::Column,
    delta: i32,
) -> Result<Option<blog::Model>, DbErr> {
    let rows = blog::Entity::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(blog::Column::Id.eq(blog_id))
        .exec_with_returning(db)
        .await?;
    Ok(rows.into_iter().next())
}

pub async fn adjust_like_count<C: ConnectionTrait>(
    txn: &C,
    blog_id: i32,
    delta: i32,
) -> Result<Option<blog::Model>, DbErr> {
    bump(txn, blog_id, blog::Column::LikeCount, delta).await
}

pub async fn adjust_comment_count<C: ConnectionTrait>(
    txn: &C,
    blog_id: i32,
    delta: i32,
) -> Result<Option<blog::Model>, DbErr> {
    bump(txn, blog_id, blog::Column::CommentCount, delta).await
}

/// `views = views + 1`; returns the row as it is after the increment.
pub async fn record_view<C: ConnectionTrait>(
    db: &C,
    blog_id: i32,
) -> Result<Option<blog::Model>, DbErr> {
    bump(db, blog_id, blog::Column::Views, 1).await
}
