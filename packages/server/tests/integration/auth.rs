use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_gets_reader_role_and_a_session_cookie() {
        let app = TestApp::spawn().await;
        let client = app.client();

        let res = client
            .post(
                routes::REGISTER,
                &json!({"name": "Alice", "email": "Alice@Example.com", "password": "secret123"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.data()["name"], "Alice");
        assert_eq!(res.data()["email"], "alice@example.com");
        assert_eq!(res.data()["role"], "reader");
        assert!(res.data()["password"].is_null());

        let cookie = res
            .set_cookies
            .iter()
            .find(|c| c.starts_with("token="))
            .expect("token cookie should be set");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));

        let me = client.get(routes::ME).await;
        assert_eq!(me.status, 200, "{}", me.text);
        assert_eq!(me.data()["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "reader").await;

        let res = app
            .client()
            .post(
                routes::REGISTER,
                &json!({"name": "Other", "email": " ALICE@example.com ", "password": "secret123"}),
            )
            .await;

        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(res.error_code(), "EMAIL_TAKEN");
        assert_eq!(res.body["success"], false);
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let client = app.client();

        let short_name = client
            .post(
                routes::REGISTER,
                &json!({"name": "A", "email": "a@example.com", "password": "secret123"}),
            )
            .await;
        assert_eq!(short_name.status, 400);
        assert_eq!(short_name.error_code(), "VALIDATION_ERROR");

        let bad_email = client
            .post(
                routes::REGISTER,
                &json!({"name": "Alice", "email": "not-an-email", "password": "secret123"}),
            )
            .await;
        assert_eq!(bad_email.status, 400);

        let short_password = client
            .post(
                routes::REGISTER,
                &json!({"name": "Alice", "email": "a@example.com", "password": "123"}),
            )
            .await;
        assert_eq!(short_password.status, 400);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let res = app
            .client()
            .post(routes::REGISTER, &json!({"name": "Alice"}))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.error_code(), "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn correct_credentials_start_a_session() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "writer").await;

        let client = app.client();
        let res = client
            .post(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["role"], "writer");
        assert!(res.token_cookie().is_some_and(|t| !t.is_empty()));

        let me = client.get(routes::ME).await;
        assert_eq!(me.status, 200);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let app = TestApp::spawn().await;
        app.register("Alice", "alice@example.com", "reader").await;
        let client = app.client();

        let wrong = client
            .post(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "wrongpass"}),
            )
            .await;
        let unknown = client
            .post(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(wrong.status, 401);
        assert_eq!(unknown.status, 401);
        assert_eq!(wrong.error_code(), "INVALID_CREDENTIALS");
        assert_eq!(wrong.body["message"], unknown.body["message"]);
    }

    #[tokio::test]
    async fn logout_clears_the_cookie() {
        let app = TestApp::spawn().await;
        let (client, _) = app.create_reader("Alice").await;

        let res = client.post_empty(routes::LOGOUT).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.token_cookie().as_deref(), Some(""));

        let me = client.get(routes::ME).await;
        assert_eq!(me.status, 401);
        assert_eq!(me.error_code(), "TOKEN_MISSING");
    }
}

mod authenticated_access {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.client().get(routes::ME).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_invalid() {
        let app = TestApp::spawn().await;
        let res = app
            .client()
            .get_with_bearer(routes::ME, "not.a.jwt")
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.error_code(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn bearer_header_works_without_cookie() {
        let app = TestApp::spawn().await;
        let client = app.client();
        let reg = client
            .post(
                routes::REGISTER,
                &json!({"name": "Alice", "email": "alice@example.com", "password": "secret123"}),
            )
            .await;
        let token = reg.token_cookie().expect("token cookie");

        let res = app.client().get_with_bearer(routes::ME, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["email"], "alice@example.com");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn update_changes_name_and_password() {
        let app = TestApp::spawn().await;
        let (client, _) = app.create_reader("Alice").await;

        let res = client
            .put(
                routes::PROFILE,
                &json!({"name": "Alice Cooper", "password": "newpassword"}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["name"], "Alice Cooper");

        let login = app
            .client()
            .post(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "newpassword"}),
            )
            .await;
        assert_eq!(login.status, 200);
    }

    #[tokio::test]
    async fn taking_another_users_email_conflicts() {
        let app = TestApp::spawn().await;
        app.create_reader("Bob").await;
        let (client, _) = app.create_reader("Alice").await;

        let res = client
            .put(routes::PROFILE, &json!({"email": "bob@example.com"}))
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.error_code(), "EMAIL_TAKEN");
    }
}

mod writer_upgrade {
    use super::*;

    #[tokio::test]
    async fn second_pending_request_conflicts() {
        let app = TestApp::spawn().await;
        let (client, _) = app.create_reader("Alice").await;

        let first = client
            .post(routes::UPGRADE_REQUEST, &json!({"message": "I write a lot"}))
            .await;
        assert_eq!(first.status, 201, "{}", first.text);
        assert_eq!(first.data()["status"], "pending");

        let second = client.post(routes::UPGRADE_REQUEST, &json!({})).await;
        assert_eq!(second.status, 409);
    }

    #[tokio::test]
    async fn writers_cannot_request_an_upgrade() {
        let app = TestApp::spawn().await;
        let (client, _) = app.create_writer("Alice").await;

        let res = client.post(routes::UPGRADE_REQUEST, &json!({})).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn become_writer_is_idempotent() {
        let app = TestApp::spawn().await;
        let (client, _) = app.create_reader("Alice").await;

        for _ in 0..2 {
            let res = client.post_empty(routes::BECOME_WRITER).await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.data()["role"], "writer");
        }

        let me = client.get(routes::ME).await;
        assert_eq!(me.data()["role"], "writer");
    }
}
