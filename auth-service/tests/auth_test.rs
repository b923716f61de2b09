//! Registration, login and user-details flows.

mod common;

use axum::http::StatusCode;
use common::{read_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn register_then_login_succeeds() {
    let app = TestApp::spawn().await;

    let body = app
        .register_user("alice@example.com", "alice", "password123")
        .await;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["is_staff"], false);
    assert!(body.get("password_hash").is_none());

    let (access, refresh) = app.login("alice@example.com", "password123").await;
    assert!(!access.is_empty());
    assert!(!refresh.is_empty());
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;

    let response = app
        .post_json(
            "/login",
            json!({ "email": "alice@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/login",
            json!({ "email": "nobody@example.com", "password": "password123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;

    let response = app
        .post_json(
            "/register",
            json!({ "email": "alice@example.com", "username": "alice2", "password": "password123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;

    let response = app
        .post_json(
            "/register",
            json!({ "email": "other@example.com", "username": "alice", "password": "password123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn short_password_fails_validation() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/register",
            json!({ "email": "alice@example.com", "username": "alice", "password": "short" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivated_user_cannot_login() {
    use auth_service::services::Store;

    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;

    let user = app
        .store
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    app.store.set_user_active(user.user_id, false).await.unwrap();

    let response = app
        .post_json(
            "/login",
            json!({ "email": "alice@example.com", "password": "password123" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_details_requires_token() {
    let app = TestApp::spawn().await;

    let response = app.get("/user-details").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_details_returns_profile_and_memberships() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;
    let (access, _) = app.login("alice@example.com", "password123").await;

    let response = app.get_auth("/user-details", &access).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["username"], "alice");
    assert!(body["groups"].as_array().unwrap().is_empty());
    assert!(body["permissions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn login_updates_last_login() {
    use auth_service::services::Store;

    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;

    let before = app
        .store
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(before.last_login.is_none());

    app.login("alice@example.com", "password123").await;

    let after = app
        .store
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(after.last_login.is_some());
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
}
