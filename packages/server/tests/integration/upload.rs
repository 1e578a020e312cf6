use crate::common::{TestApp, routes};

/// Smallest valid PNG: 1x1 transparent pixel.
const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

mod single {
    use super::*;

    #[tokio::test]
    async fn writer_uploads_and_deletes_an_image() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;

        let res = writer
            .upload(
                routes::UPLOAD_SINGLE,
                vec![("image", "pixel.png", "image/png", PNG.to_vec())],
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["format"], "png");
        let public_id = res.data()["publicId"].as_str().unwrap().to_string();
        assert!(public_id.starts_with("blog-images/"));
        assert!(
            res.data()["url"]
                .as_str()
                .unwrap()
                .starts_with("http://localhost/uploads/blog-images/")
        );

        let stored = app.upload_dir.path().join(format!("{public_id}.png"));
        assert!(stored.exists(), "image should be on disk at {}", stored.display());

        let deleted = writer.delete(&routes::upload(&public_id)).await;
        assert_eq!(deleted.status, 200, "{}", deleted.text);
        assert!(!stored.exists());

        let again = writer.delete(&routes::upload(&public_id)).await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn readers_cannot_upload() {
        let app = TestApp::spawn().await;
        let (reader, _) = app.create_reader("Reader").await;

        let res = reader
            .upload(
                routes::UPLOAD_SINGLE,
                vec![("image", "pixel.png", "image/png", PNG.to_vec())],
            )
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn non_image_and_oversized_files_are_rejected() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;

        let text = writer
            .upload(
                routes::UPLOAD_SINGLE,
                vec![("image", "notes.txt", "text/plain", b"hello".to_vec())],
            )
            .await;
        assert_eq!(text.status, 400, "{}", text.text);

        let big = writer
            .upload(
                routes::UPLOAD_SINGLE,
                vec![("image", "big.png", "image/png", vec![0u8; 65 * 1024])],
            )
            .await;
        assert_eq!(big.status, 400, "{}", big.text);

        let missing = writer
            .upload(
                routes::UPLOAD_SINGLE,
                vec![("other", "pixel.png", "image/png", PNG.to_vec())],
            )
            .await;
        assert_eq!(missing.status, 400);
    }

    #[tokio::test]
    async fn svg_images_are_rejected() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>fetch('/api/auth/me')</script></svg>"#;

        let res = writer
            .upload(
                routes::UPLOAD_SINGLE,
                vec![("image", "evil.svg", "image/svg+xml", svg.to_vec())],
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.error_code(), "VALIDATION_ERROR");

        let folder = app.upload_dir.path().join("blog-images");
        let stored = std::fs::read_dir(&folder)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn identical_uploads_are_deleted_independently() {
        let app = TestApp::spawn().await;
        let (alice, _) = app.create_writer("Alice").await;
        let (bob, _) = app.create_writer("Bob").await;

        let a = alice
            .upload(
                routes::UPLOAD_SINGLE,
                vec![("image", "pixel.png", "image/png", PNG.to_vec())],
            )
            .await;
        let b = bob
            .upload(
                routes::UPLOAD_SINGLE,
                vec![("image", "pixel.png", "image/png", PNG.to_vec())],
            )
            .await;
        let a_id = a.data()["publicId"].as_str().unwrap().to_string();
        let b_id = b.data()["publicId"].as_str().unwrap().to_string();
        assert_ne!(a_id, b_id);

        let deleted = alice.delete(&routes::upload(&a_id)).await;
        assert_eq!(deleted.status, 200, "{}", deleted.text);
        assert!(app.upload_dir.path().join(format!("{b_id}.png")).exists());
    }
}

mod multiple {
    use super::*;

    #[tokio::test]
    async fn uploads_each_image() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;

        let mut second = PNG.to_vec();
        second.push(0);
        let res = writer
            .upload(
                routes::UPLOAD_MULTIPLE,
                vec![
                    ("images", "a.png", "image/png", PNG.to_vec()),
                    ("images", "b.png", "image/png", second),
                ],
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn too_many_files_are_rejected() {
        let app = TestApp::spawn().await;
        let (writer, _) = app.create_writer("Writer").await;

        let files = (0..4)
            .map(|_| ("images", "a.png", "image/png", PNG.to_vec()))
            .collect();
        let res = writer.upload(routes::UPLOAD_MULTIPLE, files).await;
        assert_eq!(res.status, 400);
    }
}
