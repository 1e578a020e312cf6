use sea_orm::EntityTrait;
use serde_json::json;
use server::entity::{Role, user};

use crate::common::{TestApp, routes};

mod platform {
    use super::*;

    #[tokio::test]
    async fn stats_count_everything() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Public post").await;
        app.create_blog(&writer, "Hidden draft", "draft").await;
        reader.post_empty(&routes::like_toggle(blog_id)).await;
        app.create_comment(&reader, blog_id, "Hello").await;

        let res = writer.get(routes::PLATFORM_STATS).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.data();
        assert_eq!(data["users"], json!({"total": 2, "writers": 1, "readers": 1}));
        assert_eq!(data["blogs"], json!({"total": 2, "published": 1, "draft": 1}));
        assert_eq!(data["engagement"], json!({"comments": 1, "likes": 1}));
        assert_eq!(data["recentActivity"]["recentBlogs"][0]["id"], blog_id);

        assert_eq!(reader.get(routes::PLATFORM_STATS).await.status, 403);
    }

    #[tokio::test]
    async fn stats_include_soft_deleted_comments() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let blog_id = app.create_published_blog(&writer, "Public post").await;
        let kept = app.create_comment(&reader, blog_id, "Staying").await;
        let removed = app.create_comment(&reader, blog_id, "Leaving").await;
        let deleted = reader.delete(&routes::comment(removed)).await;
        assert_eq!(deleted.status, 200, "{}", deleted.text);
        assert_ne!(kept, removed);

        let res = writer.get(routes::PLATFORM_STATS).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["engagement"]["comments"], 2);
    }

    #[tokio::test]
    async fn users_list_filters_by_role_with_blog_counts() {
        let app = TestApp::spawn().await;
        let (writer, writer_id) = app.create_writer("Writer").await;
        app.create_reader("Reader").await;
        app.create_published_blog(&writer, "Counted post").await;
        app.create_blog(&writer, "Counted draft", "draft").await;

        let res = writer
            .get(&format!("{}?role=writer", routes::ADMIN_USERS))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["pagination"]["total"], 1);
        let row = &res.data()["users"][0];
        assert_eq!(row["id"], writer_id);
        assert_eq!(row["blogCount"], 2);
        assert_eq!(row["publishedBlogCount"], 1);
    }
}

mod roles {
    use super::*;

    #[tokio::test]
    async fn writer_can_promote_but_not_demote_self() {
        let app = TestApp::spawn().await;
        let (writer, writer_id) = app.create_writer("Writer").await;
        let (_, reader_id) = app.create_reader("Reader").await;

        let promote = writer
            .patch(&routes::user_role(reader_id), &json!({"role": "writer"}))
            .await;
        assert_eq!(promote.status, 200, "{}", promote.text);
        assert_eq!(promote.body["message"], "User role updated to writer");

        let demote_self = writer
            .patch(&routes::user_role(writer_id), &json!({"role": "reader"}))
            .await;
        assert_eq!(demote_self.status, 400);

        let invalid = writer
            .patch(&routes::user_role(reader_id), &json!({"role": "admin"}))
            .await;
        assert_eq!(invalid.status, 400);

        let missing = writer
            .patch(&routes::user_role(99999), &json!({"role": "writer"}))
            .await;
        assert_eq!(missing.status, 404);
    }
}

mod upgrade_requests {
    use super::*;

    #[tokio::test]
    async fn approval_promotes_the_requester_once() {
        let app = TestApp::spawn().await;
        let (writer, writer_id) = app.create_writer("Writer").await;
        let (reader, reader_id) = app.create_reader("Reader").await;

        let created = reader
            .post(routes::UPGRADE_REQUEST, &json!({"message": "Please"}))
            .await;
        let request_id = created.data_id();

        let pending = writer
            .get(&format!("{}?status=pending", routes::UPGRADE_REQUESTS))
            .await;
        assert_eq!(pending.data()["pagination"]["total"], 1);
        assert_eq!(pending.data()["requests"][0]["userName"], "Reader");

        let approved = writer
            .patch(&routes::upgrade_request(request_id), &json!({"status": "approved"}))
            .await;
        assert_eq!(approved.status, 200, "{}", approved.text);
        assert_eq!(approved.data()["status"], "approved");
        assert_eq!(approved.data()["reviewedBy"], writer_id);

        let stored = user::Entity::find_by_id(reader_id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, Role::Writer);

        let again = writer
            .patch(&routes::upgrade_request(request_id), &json!({"status": "rejected"}))
            .await;
        assert_eq!(again.status, 409);
    }

    #[tokio::test]
    async fn rejection_keeps_the_reader_role() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let request_id = reader
            .post(routes::UPGRADE_REQUEST, &json!({}))
            .await
            .data_id();

        let res = writer
            .patch(&routes::upgrade_request(request_id), &json!({"status": "rejected"}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let me = reader.get(routes::ME).await;
        assert_eq!(me.data()["role"], "reader");

        // A rejected request does not block a new one.
        let retry = reader.post(routes::UPGRADE_REQUEST, &json!({})).await;
        assert_eq!(retry.status, 201);
    }
}

mod system {
    use super::*;

    #[tokio::test]
    async fn health_root_and_fallback() {
        let app = TestApp::spawn().await;
        let client = app.client();

        let health = client.get(routes::HEALTH).await;
        assert_eq!(health.status, 200);
        assert_eq!(health.body["message"], "Server is running");

        let root = client.get("/").await;
        assert_eq!(root.status, 200);
        assert_eq!(root.data()["name"], "Blog Management System API");

        let missing = client.get("/api/nope").await;
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body["message"], "Route GET /api/nope not found");
    }
}
