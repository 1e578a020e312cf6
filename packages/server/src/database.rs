use std::time::Duration;

use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::{blog, blog_tag, comment, like};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Create the composite indexes backing the hot list queries.
///
/// Schema-sync only creates single-column and unique indexes, so these are
/// issued on startup. Failures are logged and do not abort startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes: [(&str, IndexCreateStatement); 5] = [
        (
            // Published feed: WHERE status = ? ORDER BY created_at DESC
            "idx_blog_status_created",
            Index::create()
                .if_not_exists()
                .name("idx_blog_status_created")
                .table(blog::Entity)
                .col(blog::Column::Status)
                .col(blog::Column::CreatedAt)
                .to_owned(),
        ),
        (
            // My blogs and dashboard aggregates
            "idx_blog_author_created",
            Index::create()
                .if_not_exists()
                .name("idx_blog_author_created")
                .table(blog::Entity)
                .col(blog::Column::AuthorId)
                .col(blog::Column::CreatedAt)
                .to_owned(),
        ),
        (
            "idx_comment_blog_active_created",
            Index::create()
                .if_not_exists()
                .name("idx_comment_blog_active_created")
                .table(comment::Entity)
                .col(comment::Column::BlogId)
                .col(comment::Column::IsActive)
                .col(comment::Column::CreatedAt)
                .to_owned(),
        ),
        (
            "idx_blog_like_user_created",
            Index::create()
                .if_not_exists()
                .name("idx_blog_like_user_created")
                .table(like::Entity)
                .col(like::Column::UserId)
                .col(like::Column::CreatedAt)
                .to_owned(),
        ),
        (
            // Tag filter subquery: WHERE tag IN (...)
            "idx_blog_tag_tag",
            Index::create()
                .if_not_exists()
                .name("idx_blog_tag_tag")
                .table(blog_tag::Entity)
                .col(blog_tag::Column::Tag)
                .to_owned(),
        ),
    ];

    for (name, stmt) in indexes {
        let sql = stmt.to_string(PostgresQueryBuilder);
        match db.execute_unprepared(&sql).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
