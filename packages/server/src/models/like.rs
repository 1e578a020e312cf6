use chrono::{DateTime, Utc};
use serde::Serialize;

use super::shared::{Pagination, UserSummary};

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    /// State after the toggle.
    pub liked: bool,
    /// The blog's counter as committed with the toggle.
    #[schema(example = 14)]
    pub like_count: i32,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatusResponse {
    pub liked: bool,
    /// When the like was created, if liked.
    pub liked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeCountResponse {
    pub like_count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LikedUsersResponse {
    pub users: Vec<UserSummary>,
    pub pagination: Pagination,
}

/// Blog summary in a user's like history.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikedBlog {
    pub id: i32,
    pub title: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub like_count: i32,
    pub comment_count: i32,
    /// Author's display name.
    pub author: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyLikeItem {
    pub liked_at: DateTime<Utc>,
    pub blog: LikedBlog,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MyLikesResponse {
    pub likes: Vec<MyLikeItem>,
    pub pagination: Pagination,
}
