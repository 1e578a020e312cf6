use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub blog_id: i32,
    #[sea_orm(primary_key)]
    pub tag: String,
    #[sea_orm(belongs_to, from = "blog_id", to = "id")]
    pub blog: HasOne<super::blog::Entity>,

    /// Order of the tag as submitted by the author.
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
