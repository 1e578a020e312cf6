use sea_orm::EntityTrait;
use serde_json::json;
use server::entity::{blog, comment};

use crate::common::{TestApp, routes};

async fn comment_count(app: &TestApp, blog_id: i32) -> i32 {
    blog::Entity::find_by_id(blog_id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap()
        .comment_count
}

mod create {
    use super::*;

    #[tokio::test]
    async fn comment_increments_the_counter() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, reader_id) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;

        let res = reader
            .post(&routes::blog_comments(blog_id), &json!({"content": "  Great post!  "}))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["content"], "Great post!");
        assert_eq!(res.data()["isActive"], true);
        assert_eq!(res.data()["user"]["id"], reader_id);
        assert_eq!(comment_count(&app, blog_id).await, 1);
    }

    #[tokio::test]
    async fn drafts_cannot_be_commented_on() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let blog_id = app.create_blog(&writer, "Work in progress", "draft").await;

        let res = reader
            .post(&routes::blog_comments(blog_id), &json!({"content": "Early!"}))
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(comment_count(&app, blog_id).await, 0);
    }

    #[tokio::test]
    async fn blank_and_oversized_content_is_rejected() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;

        let blank = writer
            .post(&routes::blog_comments(blog_id), &json!({"content": "   "}))
            .await;
        assert_eq!(blank.status, 400);

        let huge = writer
            .post(
                &routes::blog_comments(blog_id),
                &json!({"content": "x".repeat(1001)}),
            )
            .await;
        assert_eq!(huge.status, 400);
    }

    #[tokio::test]
    async fn anonymous_users_cannot_comment() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;

        let res = app
            .client()
            .post(&routes::blog_comments(blog_id), &json!({"content": "Hi"}))
            .await;
        assert_eq!(res.status, 401);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_is_soft_and_decrements_the_counter() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;
        let id = app.create_comment(&reader, blog_id, "Soon gone").await;

        let res = reader.delete(&routes::comment(id)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let row = comment::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .expect("comment row should still exist");
        assert!(!row.is_active);
        assert_eq!(comment_count(&app, blog_id).await, 0);

        let list = app.client().get(&routes::blog_comments(blog_id)).await;
        assert_eq!(list.data()["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn deleting_twice_does_not_double_decrement() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;
        app.create_comment(&writer, blog_id, "Stays").await;
        let id = app.create_comment(&reader, blog_id, "Goes").await;

        assert_eq!(reader.delete(&routes::comment(id)).await.status, 200);
        let again = reader.delete(&routes::comment(id)).await;
        assert_eq!(again.status, 400);
        assert_eq!(comment_count(&app, blog_id).await, 1);
    }

    #[tokio::test]
    async fn blog_author_may_delete_but_strangers_may_not() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let (stranger, _) = app.create_reader("Stranger").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;
        let id = app.create_comment(&reader, blog_id, "Moderate me").await;

        assert_eq!(stranger.delete(&routes::comment(id)).await.status, 403);
        assert_eq!(writer.delete(&routes::comment(id)).await.status, 200);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn only_the_commenter_can_edit_active_comments() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;
        let id = app.create_comment(&reader, blog_id, "Frist").await;

        let by_author = writer
            .put(&routes::comment(id), &json!({"content": "Edited by someone else"}))
            .await;
        assert_eq!(by_author.status, 403);

        let by_owner = reader
            .put(&routes::comment(id), &json!({"content": "First"}))
            .await;
        assert_eq!(by_owner.status, 200, "{}", by_owner.text);
        assert_eq!(by_owner.data()["content"], "First");

        reader.delete(&routes::comment(id)).await;
        let after_delete = reader
            .put(&routes::comment(id), &json!({"content": "Resurrect"}))
            .await;
        assert_eq!(after_delete.status, 400);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn my_comments_include_blog_title() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;
        app.create_comment(&reader, blog_id, "One").await;
        app.create_comment(&reader, blog_id, "Two").await;

        let res = reader.get(routes::MY_COMMENTS).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["pagination"]["total"], 2);
        assert_eq!(res.data()["comments"][0]["content"], "Two");
        assert_eq!(res.data()["comments"][0]["blog"]["title"], "Discuss this");
    }

    #[tokio::test]
    async fn unknown_blog_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.client().get(&routes::blog_comments(9999)).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn single_comment_requires_auth() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let blog_id = app.create_published_blog(&writer, "Discuss this").await;
        let id = app.create_comment(&writer, blog_id, "Hello").await;

        assert_eq!(app.client().get(&routes::comment(id)).await.status, 401);
        let res = writer.get(&routes::comment(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.data()["blog"]["id"], blog_id);
    }
}
