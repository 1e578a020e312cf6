use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, UserSummary};
use crate::entity::comment;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommentRequest {
    /// 1-1000 characters after trimming.
    #[schema(example = "Great write-up!")]
    pub content: String,
}

/// Blog reference embedded in a comment.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BlogRef {
    pub id: i32,
    pub title: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i32,
    pub content: String,
    pub is_active: bool,
    pub blog_id: i32,
    /// Present on single-comment and my-comments responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog: Option<BlogRef>,
    /// Present whenever the commenter still exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(model: comment::Model, user: Option<UserSummary>, blog: Option<BlogRef>) -> Self {
        Self {
            id: model.id,
            content: model.content,
            is_active: model.is_active,
            blog_id: model.blog_id,
            blog,
            user,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
    pub pagination: Pagination,
}

/// Returns the trimmed content.
pub fn validate_comment(payload: &CommentRequest) -> Result<String, AppError> {
    let content = payload.content.trim();
    let len = content.chars().count();
    if len == 0 {
        return Err(AppError::Validation("Comment content is required".into()));
    }
    if len > 1000 {
        return Err(AppError::Validation(
            "Comment cannot be more than 1000 characters".into(),
        ));
    }
    Ok(content.to_string())
}
