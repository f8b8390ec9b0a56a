//! E2E tests: accounts and bearer tokens.

use actix_web::http::StatusCode;
use actix_web::test;
use codementor_lib::db::users;
use codementor_lib::entity::user;
use codementor_lib::error::AppError;
use codementor_lib::models::user::GoogleUserInfo;
use jsonwebtoken::{EncodingKey, Header};
use sea_orm::{EntityTrait, PaginatorTrait};
use secrecy::ExposeSecret;
use serde_json::json;

use super::test_helpers::*;

#[actix_rt::test]
async fn test_signup_returns_token_and_user_without_password() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "username": "alice",
            "email": "Alice@Example.com",
            "password": TEST_PASSWORD,
        }))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[actix_rt::test]
async fn test_signup_validation_errors() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let cases = [
        (json!({ "username": "bob", "email": "bob@example.com" }), "All fields are required"),
        (
            json!({ "username": "bob", "email": "bob@example.com", "password": "123" }),
            "Password must be at least 6 characters",
        ),
        (
            json!({ "username": "bob", "email": "not-an-email", "password": TEST_PASSWORD }),
            "Please provide a valid email address",
        ),
    ];

    for (payload, message) in cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(payload)
            .to_request();
        let (status, body) = call_json(&app, req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_INPUT");
        assert_eq!(body["message"], message);
    }
}

#[actix_rt::test]
async fn test_duplicate_email_and_username_rejected() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    signup(&app, "carol").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "username": "carol2",
            "email": "CAROL@example.com",
            "password": TEST_PASSWORD,
        }))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already registered");

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "username": "carol",
            "email": "other@example.com",
            "password": TEST_PASSWORD,
        }))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already taken");
}

#[actix_rt::test]
async fn test_login_and_me() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let user = signup(&app, "dave").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "dave@example.com", "password": TEST_PASSWORD }))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.as_str());
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "dave");
}

#[actix_rt::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    signup(&app, "erin").await;

    for (email, password) in [
        ("erin@example.com", "wrong-password"),
        ("nobody@example.com", TEST_PASSWORD),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let (status, body) = call_json(&app, req).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid email or password");
    }
}

#[actix_rt::test]
async fn test_missing_tampered_and_foreign_tokens_rejected() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let user = signup(&app, "frank").await;

    // Flip the first signature character
    let sig_start = user.token.rfind('.').unwrap() + 1;
    let flipped = if user.token[sig_start..].starts_with('A') { "B" } else { "A" };
    let tampered = format!(
        "{}{}{}",
        &user.token[..sig_start],
        flipped,
        &user.token[sig_start + 1..]
    );

    let foreign = jsonwebtoken::encode(
        &Header::default(),
        &json!({
            "userId": user.id,
            "iat": chrono::Utc::now().timestamp(),
            "exp": chrono::Utc::now().timestamp() + 3600,
        }),
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let headers = [
        None,
        Some("Bearer ".to_string()),
        Some(format!("Token {}", user.token)),
        Some(format!("Bearer {}", tampered)),
        Some(format!("Bearer {}", foreign)),
    ];

    for header in headers {
        let mut req = test::TestRequest::get().uri("/api/auth/me");
        if let Some(value) = header.clone() {
            req = req.insert_header(("Authorization", value));
        }
        let (status, body) = call_json(&app, req.to_request()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", header);
        assert_eq!(body["message"], "Invalid token");
    }
}

#[actix_rt::test]
async fn test_expired_token_rejected() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let user = signup(&app, "grace").await;

    let past = chrono::Utc::now() - chrono::Duration::hours(1);
    let expired = jsonwebtoken::encode(
        &Header::default(),
        &json!({
            "userId": user.id,
            "iat": (past - chrono::Duration::hours(1)).timestamp(),
            "exp": past.timestamp(),
        }),
        &EncodingKey::from_secret(env.config.auth.jwt_secret.expose_secret().as_bytes()),
    )
    .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&expired))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[actix_rt::test]
async fn test_token_for_deleted_user_yields_404_on_me() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let token = env.issuer().issue(uuid::Uuid::new_v4()).unwrap();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[actix_rt::test]
async fn test_update_contest_level() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let user = signup(&app, "heidi").await;

    let req = test::TestRequest::put()
        .uri("/api/auth/contest-level")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "level": "Expert" }))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["contestLevel"], "Expert");

    let req = test::TestRequest::put()
        .uri("/api/auth/contest-level")
        .insert_header(bearer(&user.token))
        .set_json(json!({}))
        .to_request();
    let (status, body) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Level is required");
}

#[actix_rt::test]
async fn test_google_login_disabled_without_credentials() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::get().uri("/api/auth/google").to_request();
    let (status, _) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_malformed_json_body_uses_error_envelope() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

fn google_info(sub: &str, email: &str, verified: bool, name: Option<&str>) -> GoogleUserInfo {
    GoogleUserInfo {
        sub: sub.to_string(),
        email: Some(email.to_string()),
        email_verified: verified,
        name: name.map(str::to_string),
        picture: Some("https://example.com/avatar.png".to_string()),
    }
}

async fn user_count(env: &TestEnv) -> u64 {
    user::Entity::find()
        .count(env.pool.connection())
        .await
        .expect("count users")
}

#[actix_rt::test]
async fn test_google_login_by_known_id_returns_same_account() {
    let env = TestEnv::start().await;
    let db = env.pool.connection();

    let info = google_info("google-1000001", "gina@gmail.com", true, Some("gina"));
    let first = users::upsert_from_google(db, &info, true).await.unwrap();

    // A changed email on the provider side still resolves by Google id.
    let renamed = google_info("google-1000001", "gina.new@gmail.com", false, Some("gina"));
    let second = users::upsert_from_google(db, &renamed, false).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.email, "gina@gmail.com");
    assert_eq!(user_count(&env).await, 1);
}

#[actix_rt::test]
async fn test_google_login_links_verified_email_to_password_account() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let alice = signup(&app, "alice").await;

    let info = google_info("google-2000002", "Alice@Example.com", true, Some("Alice G"));
    let linked = users::upsert_from_google(env.pool.connection(), &info, true)
        .await
        .unwrap();

    assert_eq!(linked.id.to_string(), alice.id);
    assert_eq!(linked.google_id.as_deref(), Some("google-2000002"));
    assert!(linked.password_hash.is_some());
    assert_eq!(user_count(&env).await, 1);

    // The password login keeps working after linking.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": TEST_PASSWORD }))
        .to_request();
    let (status, _) = call_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_google_login_refuses_unverified_email_match() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    let alice = signup(&app, "alice").await;

    let info = google_info("google-3000003", "alice@example.com", false, None);
    let err = users::upsert_from_google(env.pool.connection(), &info, true)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unauthorized(_)));
    let stored = users::find_by_email(env.pool.connection(), "alice@example.com")
        .await
        .unwrap()
        .expect("alice still exists");
    assert_eq!(stored.id.to_string(), alice.id);
    assert!(stored.google_id.is_none());
    assert_eq!(user_count(&env).await, 1);
}

#[actix_rt::test]
async fn test_google_login_refuses_email_match_when_linking_disabled() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    signup(&app, "alice").await;

    let info = google_info("google-4000004", "alice@example.com", true, None);
    let err = users::upsert_from_google(env.pool.connection(), &info, false)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(user_count(&env).await, 1);
}

#[actix_rt::test]
async fn test_google_login_creates_account_with_unique_username() {
    let env = TestEnv::start().await;
    let app = create_test_app(&env).await;
    signup(&app, "alice").await;

    let info = google_info("google-5123456", "alice.g@gmail.com", true, Some("alice"));
    let created = users::upsert_from_google(env.pool.connection(), &info, true)
        .await
        .unwrap();

    assert_eq!(created.username, "alice-123456");
    assert_eq!(created.email, "alice.g@gmail.com");
    assert_eq!(created.google_id.as_deref(), Some("google-5123456"));
    assert!(created.password_hash.is_none());
    assert_eq!(user_count(&env).await, 2);

    // Without a display name the email local part is used.
    let info = google_info("google-6000006", "bob@gmail.com", true, None);
    let bob = users::upsert_from_google(env.pool.connection(), &info, true)
        .await
        .unwrap();
    assert_eq!(bob.username, "bob");
}
