use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blog::BlogResponse;
use super::shared::Pagination;
use crate::entity::{Role, UpgradeStatus, upgrade_request, user};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserCounts {
    pub total: u64,
    pub writers: u64,
    pub readers: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BlogCounts {
    pub total: u64,
    pub published: u64,
    pub draft: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EngagementCounts {
    pub comments: u64,
    pub likes: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformActivity {
    /// Five newest published blogs.
    pub recent_blogs: Vec<BlogResponse>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatsResponse {
    pub users: UserCounts,
    pub blogs: BlogCounts,
    pub engagement: EngagementCounts,
    pub recent_activity: PlatformActivity,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserItem {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub blog_count: u64,
    pub published_blog_count: u64,
    pub created_at: DateTime<Utc>,
}

impl AdminUserItem {
    pub fn new(u: user::Model, blog_count: u64, published_blog_count: u64) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            blog_count,
            published_blog_count,
            created_at: u.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminUserListResponse {
    pub users: Vec<AdminUserItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct UpgradeRequestListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<UpgradeStatus>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequestItem {
    pub id: i32,
    pub user_id: i32,
    /// Requester's display name, if the account still exists.
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub message: Option<String>,
    pub status: UpgradeStatus,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UpgradeRequestItem {
    pub fn new(m: upgrade_request::Model, user: Option<user::Model>) -> Self {
        let (user_name, user_email) = match user {
            Some(u) => (Some(u.name), Some(u.email)),
            None => (None, None),
        };
        Self {
            id: m.id,
            user_id: m.user_id,
            user_name,
            user_email,
            message: m.message,
            status: m.status,
            reviewed_by: m.reviewed_by,
            reviewed_at: m.reviewed_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequestListResponse {
    pub requests: Vec<UpgradeRequestItem>,
    pub pagination: Pagination,
}

/// Reviewer decision on a pending upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for UpgradeStatus {
    fn from(d: ReviewDecision) -> Self {
        match d {
            ReviewDecision::Approved => UpgradeStatus::Approved,
            ReviewDecision::Rejected => UpgradeStatus::Rejected,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReviewUpgradeRequest {
    pub status: ReviewDecision,
}
