use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, Utc};
use sea_orm::FromQueryResult;
use serde::Serialize;

use super::comment::CommentResponse;
use crate::entity::BlogStatus;

/// Number of months covered by `GET /dashboard/monthly-stats`.
pub const MONTHLY_WINDOW: u32 = 6;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_blogs: u64,
    pub published: u64,
    pub drafts: u64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    /// `(likes + comments) / views` as a percentage with one decimal.
    #[schema(example = "12.5%")]
    pub engagement_rate: String,
}

#[derive(Debug, Clone, Serialize, FromQueryResult, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogSummaryItem {
    pub id: i32,
    pub title: String,
    pub status: BlogStatus,
    pub views: i32,
    pub like_count: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    /// Five newest blogs in any state.
    pub recent_blogs: Vec<BlogSummaryItem>,
    /// Five most-viewed published blogs.
    pub top_performing_blogs: Vec<BlogSummaryItem>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub overview: DashboardOverview,
    pub recent_activity: RecentActivity,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentLike {
    pub user_id: i32,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogEngagement {
    /// Ten newest comments, including soft-deleted ones.
    pub comments: Vec<CommentResponse>,
    /// Ten newest likes.
    pub recent_likes: Vec<RecentLike>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BlogAnalyticsResponse {
    pub blog: BlogSummaryItem,
    pub engagement: BlogEngagement,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    #[schema(example = 2026)]
    pub year: i32,
    /// 1-12.
    #[schema(example = 9)]
    pub month: u32,
    /// Blogs created in this month that are currently published.
    pub blogs_published: u64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatsResponse {
    pub monthly_stats: Vec<MonthlyStat>,
}

/// Row fed into [`group_monthly`].
#[derive(Debug, Clone, FromQueryResult)]
pub struct MonthlyRow {
    pub created_at: DateTime<Utc>,
    pub status: BlogStatus,
    pub views: i32,
    pub like_count: i32,
    pub comment_count: i32,
}

pub fn engagement_rate(views: i64, likes: i64, comments: i64) -> String {
    if views <= 0 {
        return "0%".to_string();
    }
    let rate = (likes + comments) as f64 / views as f64 * 100.0;
    format!("{rate:.1}%")
}

/// Start of the monthly window ending at `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(MONTHLY_WINDOW))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Group blogs by (year, month) of creation, oldest month first.
pub fn group_monthly(rows: &[MonthlyRow]) -> Vec<MonthlyStat> {
    let mut months: BTreeMap<(i32, u32), MonthlyStat> = BTreeMap::new();
    for row in rows {
        let key = (row.created_at.year(), row.created_at.month());
        let stat = months.entry(key).or_insert_with(|| MonthlyStat {
            year: key.0,
            month: key.1,
            ..Default::default()
        });
        if row.status == BlogStatus::Published {
            stat.blogs_published += 1;
        }
        stat.total_views += i64::from(row.views);
        stat.total_likes += i64::from(row.like_count);
        stat.total_comments += i64::from(row.comment_count);
    }
    months.into_values().collect()
}
