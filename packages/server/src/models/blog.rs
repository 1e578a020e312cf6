use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, UserSummary, double_option};
use crate::entity::{BlogStatus, blog};
use crate::error::AppError;

pub const EXCERPT_CHARS: usize = 500;
pub const MAX_TAGS: usize = 20;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    /// 5-200 characters after trimming.
    #[schema(example = "Ownership in practice")]
    pub title: String,
    /// HTML body, at least 10 characters.
    #[schema(example = "<p>Borrowing rules, by example.</p>")]
    pub content: String,
    #[serde(default)]
    #[schema(example = json!(["rust", "memory"]))]
    pub tags: Vec<String>,
    /// Defaults to `draft`.
    pub status: Option<BlogStatus>,
    /// Absolute http(s) URL. Empty string or null means no cover image.
    pub cover_image: Option<String>,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Replaces the whole tag list when present.
    pub tags: Option<Vec<String>>,
    pub status: Option<BlogStatus>,
    /// `null` or `""` clears the cover image.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cover_image: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct BlogListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 10)]
    pub limit: Option<u64>,
    /// Comma-separated tags; a blog matches if it has any of them.
    #[param(example = "rust,web")]
    pub tags: Option<String>,
    /// Case-insensitive substring of title or content.
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct BlogSearchQuery {
    /// Case-insensitive substring of title, content or excerpt.
    pub q: Option<String>,
    /// Comma-separated tags, any-match.
    pub tags: Option<String>,
    /// Case-insensitive substring of the author's name.
    pub author: Option<String>,
    /// `recent` (default), `popular`, `likes` or `comments`.
    #[param(example = "recent")]
    pub sort_by: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Sort orders accepted by blog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSort {
    Recent,
    Popular,
    Likes,
    Comments,
}

impl SearchSort {
    /// Unknown values fall back to `Recent`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("popular") => SearchSort::Popular,
            Some("likes") => SearchSort::Likes,
            Some("comments") => SearchSort::Comments,
            _ => SearchSort::Recent,
        }
    }

    pub fn column(self) -> blog::Column {
        match self {
            SearchSort::Recent => blog::Column::CreatedAt,
            SearchSort::Popular => blog::Column::Views,
            SearchSort::Likes => blog::Column::LikeCount,
            SearchSort::Comments => blog::Column::CommentCount,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct MyBlogsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only blogs in this state.
    pub status: Option<BlogStatus>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogResponse {
    #[schema(example = 12)]
    pub id: i32,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub status: BlogStatus,
    pub tags: Vec<String>,
    pub views: i32,
    pub like_count: i32,
    pub comment_count: i32,
    pub author: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogResponse {
    pub fn new(model: blog::Model, tags: Vec<String>, author: UserSummary) -> Self {
        Self {
            id: model.id,
            title: model.title,
            content: model.content,
            excerpt: model.excerpt,
            cover_image: model.cover_image,
            status: model.status,
            tags,
            views: model.views,
            like_count: model.like_count,
            comment_count: model.comment_count,
            author,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Single blog plus whether the caller has liked it.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetailResponse {
    #[serde(flatten)]
    pub blog: BlogResponse,
    /// Always `false` for anonymous callers.
    pub user_liked: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogListResponse {
    pub blogs: Vec<BlogResponse>,
    pub pagination: Pagination,
}

/// Per-writer totals for `GET /blogs/stats`.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogStatsResponse {
    pub published: u64,
    pub draft: u64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}

/// First [`EXCERPT_CHARS`] characters of `content`, trimmed.
pub fn make_excerpt(content: &str) -> String {
    let cut = content
        .char_indices()
        .nth(EXCERPT_CHARS)
        .map_or(content.len(), |(i, _)| i);
    content[..cut].trim().to_string()
}

pub fn validate_title(title: &str) -> Result<(), AppError> {
    let len = title.trim().chars().count();
    if !(5..=200).contains(&len) {
        return Err(AppError::Validation(
            "Title must be 5-200 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<(), AppError> {
    if content.chars().count() < 10 {
        return Err(AppError::Validation(
            "Content must be at least 10 characters".into(),
        ));
    }
    Ok(())
}

/// Trim tags, drop blanks and duplicates, keep submission order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, AppError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        if tag.chars().count() > 50 {
            return Err(AppError::Validation(
                "Tags must be at most 50 characters".into(),
            ));
        }
        out.push(tag.to_string());
    }
    if out.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "At most {MAX_TAGS} tags are allowed"
        )));
    }
    Ok(out)
}

/// `None` and `""` mean no cover image; anything else must be an http(s) URL.
pub fn normalize_cover_image(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(url) = raw.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') && !url.contains(' ') => {
            Ok(Some(url.to_string()))
        }
        _ => Err(AppError::Validation(
            "Cover image must be a valid http(s) URL".into(),
        )),
    }
}

pub fn validate_create_blog(payload: &CreateBlogRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_content(&payload.content)
}

pub fn validate_update_blog(payload: &UpdateBlogRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    if let Some(ref content) = payload.content {
        validate_content(content)?;
    }
    Ok(())
}
