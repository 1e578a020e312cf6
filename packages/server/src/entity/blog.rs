use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Publication state of a blog.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

impl BlogStatus {
    pub fn toggled(self) -> Self {
        match self {
            BlogStatus::Draft => BlogStatus::Published,
            BlogStatus::Published => BlogStatus::Draft,
        }
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String, // HTML from the rich-text editor
    /// First 500 characters of `content`, refreshed whenever content is saved.
    #[sea_orm(column_type = "Text")]
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub status: BlogStatus,

    pub views: i32,
    /// Maintained in the same transaction as like inserts/deletes.
    pub like_count: i32,
    /// Number of active comments, maintained like `like_count`.
    pub comment_count: i32,

    pub author_id: i32,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub tags: HasMany<super::blog_tag::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    #[sea_orm(has_many)]
    pub likes: HasMany<super::like::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
