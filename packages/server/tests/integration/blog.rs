use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use server::entity::{blog, blog_tag, comment, like};

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn reader_cannot_create_a_blog() {
        let app = TestApp::spawn().await;
        let (reader, _) = app.create_reader("Reader").await;

        let res = reader
            .post(
                routes::BLOGS,
                &json!({"title": "Reader post", "content": "Readers should not post here."}),
            )
            .await;

        assert_eq!(res.status, 403, "{}", res.text);
        assert_eq!(res.error_code(), "PERMISSION_DENIED");
        assert_eq!(blog::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn writer_creates_a_draft_with_derived_excerpt() {
        let app = TestApp::spawn().await;
        let (writer, writer_id) = app.create_writer("Writer").await;
        let content = "x".repeat(600);

        let res = writer
            .post(
                routes::BLOGS,
                &json!({
                    "title": "  First post  ",
                    "content": content,
                    "tags": ["rust", " rust ", "web"],
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let data = res.data();
        assert_eq!(data["title"], "First post");
        assert_eq!(data["status"], "draft");
        assert_eq!(data["excerpt"].as_str().unwrap().chars().count(), 500);
        assert_eq!(data["author"]["id"], writer_id);
        assert_eq!(data["views"], 0);
        assert_eq!(data["likeCount"], 0);
        assert_eq!(data["tags"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn short_title_is_rejected() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;

        let res = writer
            .post(
                routes::BLOGS,
                &json!({"title": "Hey", "content": "Long enough content here."}),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn each_fetch_increments_views_by_one() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let id = app.create_published_blog(&writer, "Counting views").await;
        let anon = app.client();

        for expected in 1..=3 {
            let res = anon.get(&routes::blog(id)).await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.data()["views"], expected);
        }

        let stored = blog::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.views, 3);
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_everyone_but_the_author() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let id = app.create_blog(&writer, "Secret draft", "draft").await;

        assert_eq!(app.client().get(&routes::blog(id)).await.status, 404);
        assert_eq!(reader.get(&routes::blog(id)).await.status, 404);
        assert_eq!(writer.get(&routes::blog(id)).await.status, 200);

        let list = app.client().get(routes::BLOGS).await;
        assert_eq!(list.data()["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn user_liked_reflects_the_viewer() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let id = app.create_published_blog(&writer, "Likeable post").await;

        reader.post_empty(&routes::blog_like(id)).await;

        assert_eq!(reader.get(&routes::blog(id)).await.data()["userLiked"], true);
        assert_eq!(writer.get(&routes::blog(id)).await.data()["userLiked"], false);
        assert_eq!(app.client().get(&routes::blog(id)).await.data()["userLiked"], false);
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let res = app.client().get("/api/blogs/not-a-number").await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Invalid ID format");
    }
}

mod list_and_search {
    use super::*;

    #[tokio::test]
    async fn list_filters_by_tag_and_paginates() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        for i in 0..3 {
            app.create_published_blog(&writer, &format!("Tagged post {i}")).await;
        }
        writer
            .post(
                routes::BLOGS,
                &json!({
                    "title": "Untagged post",
                    "content": "Nothing to see in this one.",
                    "tags": ["other"],
                    "status": "published",
                }),
            )
            .await;

        let page = app
            .client()
            .get(&format!("{}?tags=rust&limit=2&page=2", routes::BLOGS))
            .await;
        assert_eq!(page.status, 200, "{}", page.text);
        assert_eq!(page.data()["pagination"]["total"], 3);
        assert_eq!(page.data()["pagination"]["pages"], 2);
        assert_eq!(page.data()["blogs"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn huge_page_number_returns_an_empty_page() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        app.create_published_blog(&writer, "Only published post").await;

        for page in ["18446744073709551615", "200000000000000000"] {
            let res = app
                .client()
                .get(&format!("{}?page={page}&limit=100", routes::BLOGS))
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.data()["pagination"]["page"], server::models::shared::MAX_PAGE);
            assert_eq!(res.data()["pagination"]["total"], 1);
            assert!(res.data()["blogs"].as_array().unwrap().is_empty());
        }

        let likes = writer
            .get(&format!("{}?page=18446744073709551615", routes::MY_LIKES))
            .await;
        assert_eq!(likes.status, 200, "{}", likes.text);
    }

    #[tokio::test]
    async fn search_matches_text_case_insensitively_and_by_author() {
        let app = TestApp::spawn().await;
        let (ada, _) = app.create_writer("Ada").await;
        let (bob, _) = app.create_writer("Bob").await;
        app.create_published_blog(&ada, "Ownership explained").await;
        app.create_published_blog(&bob, "Borrowing explained").await;

        let by_text = app
            .client()
            .get(&format!("{}?q=OWNERSHIP", routes::BLOG_SEARCH))
            .await;
        assert_eq!(by_text.data()["pagination"]["total"], 1);

        let by_author = app
            .client()
            .get(&format!("{}?author=bo", routes::BLOG_SEARCH))
            .await;
        assert_eq!(by_author.data()["pagination"]["total"], 1);
        assert_eq!(by_author.data()["blogs"][0]["title"], "Borrowing explained");

        let no_author = app
            .client()
            .get(&format!("{}?author=zed", routes::BLOG_SEARCH))
            .await;
        assert_eq!(no_author.data()["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn search_sorts_by_views() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let quiet = app.create_published_blog(&writer, "Quiet post").await;
        let popular = app.create_published_blog(&writer, "Popular post").await;
        let anon = app.client();
        for _ in 0..3 {
            anon.get(&routes::blog(popular)).await;
        }
        anon.get(&routes::blog(quiet)).await;

        let res = anon
            .get(&format!("{}?sortBy=popular", routes::BLOG_SEARCH))
            .await;
        assert_eq!(res.data()["blogs"][0]["id"], popular);
        assert_eq!(res.data()["blogs"][1]["id"], quiet);
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn update_rederives_excerpt_and_replaces_tags() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let id = app.create_published_blog(&writer, "Original title").await;

        let res = writer
            .put(
                &routes::blog(id),
                &json!({"content": "Brand new content for this post.", "tags": ["new"]}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["title"], "Original title");
        assert_eq!(res.data()["excerpt"], "Brand new content for this post.");
        assert_eq!(res.data()["tags"], json!(["new"]));
    }

    #[tokio::test]
    async fn other_writers_cannot_modify() {
        let app = TestApp::spawn().await;
        let (owner, _) = app.create_writer("Owner").await;
        let (other, _) = app.create_writer("Other").await;
        let id = app.create_published_blog(&owner, "Owned post").await;

        let update = other
            .put(&routes::blog(id), &json!({"title": "Hijacked title"}))
            .await;
        assert_eq!(update.status, 403);
        assert_eq!(update.body["message"], "Not authorized to update this blog");

        assert_eq!(other.delete(&routes::blog(id)).await.status, 403);
        assert_eq!(other.patch_empty(&routes::blog_publish(id)).await.status, 403);
    }

    #[tokio::test]
    async fn publish_toggles_status() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let id = app.create_blog(&writer, "Toggle me please", "draft").await;

        let publish = writer.patch_empty(&routes::blog_publish(id)).await;
        assert_eq!(publish.status, 200, "{}", publish.text);
        assert_eq!(publish.data()["status"], "published");

        let unpublish = writer.patch_empty(&routes::blog_publish(id)).await;
        assert_eq!(unpublish.data()["status"], "draft");
    }

    #[tokio::test]
    async fn delete_removes_children() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (reader, _) = app.create_reader("Reader").await;
        let id = app.create_published_blog(&writer, "Short lived").await;
        app.create_comment(&reader, id, "Nice one").await;
        reader.post_empty(&routes::blog_like(id)).await;

        let res = writer.delete(&routes::blog(id)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert!(blog::Entity::find_by_id(id).one(&app.db).await.unwrap().is_none());
        let comments = comment::Entity::find()
            .filter(comment::Column::BlogId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let likes = like::Entity::find()
            .filter(like::Column::BlogId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        let tags = blog_tag::Entity::find()
            .filter(blog_tag::Column::BlogId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!((comments, likes, tags), (0, 0, 0));
    }
}

mod writer_views {
    use super::*;

    #[tokio::test]
    async fn my_blogs_and_stats_cover_only_own_blogs() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let (other, _) = app.create_writer("Other").await;
        app.create_published_blog(&writer, "Mine published").await;
        app.create_blog(&writer, "Mine drafted", "draft").await;
        app.create_published_blog(&other, "Not mine").await;

        let mine = writer.get(routes::MY_BLOGS).await;
        assert_eq!(mine.data()["pagination"]["total"], 2);

        let drafts = writer
            .get(&format!("{}?status=draft", routes::MY_BLOGS))
            .await;
        assert_eq!(drafts.data()["pagination"]["total"], 1);

        let stats = writer.get(routes::BLOG_STATS).await;
        assert_eq!(stats.status, 200, "{}", stats.text);
        assert_eq!(stats.data()["published"], 1);
        assert_eq!(stats.data()["draft"], 1);
    }
}
