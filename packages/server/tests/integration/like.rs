use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use server::entity::{blog, like};

use crate::common::{TestApp, routes};

async fn counts(app: &TestApp, blog_id: i32) -> (i32, u64) {
    let counter = blog::Entity::find_by_id(blog_id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap()
        .like_count;
    let rows = like::Entity::find()
        .filter(like::Column::BlogId.eq(blog_id))
        .count(&app.db)
        .await
        .unwrap();
    (counter, rows)
}

mod toggle {
    use super::*;

    #[tokio::test]
    async fn toggling_twice_returns_to_unliked() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Like me").await;

        let first = reader.post_empty(&routes::like_toggle(blog_id)).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.data()["liked"], true);
        assert_eq!(first.data()["likeCount"], 1);
        assert_eq!(counts(&app, blog_id).await, (1, 1));

        let second = reader.post_empty(&routes::like_toggle(blog_id)).await;
        assert_eq!(second.data()["liked"], false);
        assert_eq!(second.data()["likeCount"], 0);
        assert_eq!(counts(&app, blog_id).await, (0, 0));
    }

    #[tokio::test]
    async fn counter_matches_rows_across_users_and_routes() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let blog_id = app.create_published_blog(&writer, "Like me").await;

        let mut readers = Vec::new();
        for name in ["Ann", "Ben", "Cat"] {
            readers.push(app.create_reader(name).await.0);
        }
        for r in &readers {
            r.post_empty(&routes::like_toggle(blog_id)).await;
        }
        // The blog route shares the toggle.
        readers[0].post_empty(&routes::blog_like(blog_id)).await;

        assert_eq!(counts(&app, blog_id).await, (2, 2));
        let count = app.client().get(&routes::like_count(blog_id)).await;
        assert_eq!(count.data()["likeCount"], 2);
    }

    #[tokio::test]
    async fn concurrent_toggles_keep_the_counter_exact() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let blog_id = app.create_published_blog(&writer, "Like me").await;

        let mut readers = Vec::new();
        for i in 0..5 {
            readers.push(app.create_reader(&format!("Reader{i}")).await.0);
        }
        let path = routes::like_toggle(blog_id);
        let mut tasks = tokio::task::JoinSet::new();
        for r in readers {
            let path = path.clone();
            tasks.spawn(async move { r.post_empty(&path).await.status });
        }
        while let Some(status) = tasks.join_next().await {
            assert_eq!(status.unwrap(), 200);
        }

        assert_eq!(counts(&app, blog_id).await, (5, 5));
    }

    #[tokio::test]
    async fn drafts_cannot_be_liked() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let blog_id = app.create_blog(&writer, "Not yet out", "draft").await;

        let res = writer.post_empty(&routes::like_toggle(blog_id)).await;
        assert_eq!(res.status, 403);
        assert_eq!(counts(&app, blog_id).await, (0, 0));
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn status_users_and_my_likes() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, reader_id) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Like me").await;

        let before = reader.get(&routes::like_status(blog_id)).await;
        assert_eq!(before.data()["liked"], false);
        assert!(before.data()["likedAt"].is_null());

        reader.post_empty(&routes::like_toggle(blog_id)).await;

        let after = reader.get(&routes::like_status(blog_id)).await;
        assert_eq!(after.data()["liked"], true);
        assert!(after.data()["likedAt"].is_string());

        let users = app.client().get(&routes::liked_users(blog_id)).await;
        assert_eq!(users.data()["pagination"]["total"], 1);
        assert_eq!(users.data()["users"][0]["id"], reader_id);

        let mine = reader.get(routes::MY_LIKES).await;
        assert_eq!(mine.data()["likes"][0]["blog"]["id"], blog_id);
        assert_eq!(mine.data()["likes"][0]["blog"]["author"], "Writer");
    }

    #[tokio::test]
    async fn count_of_unknown_blog_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.client().get(&routes::like_count(424242)).await;
        assert_eq!(res.status, 404);
    }
}
