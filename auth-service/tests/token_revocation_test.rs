//! Refresh token revocation via the blacklist. Logout sits behind the
//! access-token gate, so every call here carries a bearer header.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn logout_revokes_refresh_token() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;
    let (access, refresh) = app.login("alice@example.com", "password123").await;

    assert!(app.state.auth_service.verify_refresh(&refresh).await.is_ok());

    let response = app
        .post_json_auth("/logout", json!({ "refresh": refresh }), &access)
        .await;
    assert_eq!(response.status(), StatusCode::RESET_CONTENT);

    assert!(app
        .state
        .auth_service
        .verify_refresh(&refresh)
        .await
        .is_err());
}

#[tokio::test]
async fn logout_without_access_token_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;
    let (_, refresh) = app.login("alice@example.com", "password123").await;

    let response = app
        .post_json("/logout", json!({ "refresh": refresh.clone() }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The anonymous call must not have revoked anything.
    assert!(app.state.auth_service.verify_refresh(&refresh).await.is_ok());
}

#[tokio::test]
async fn double_logout_is_idempotent() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;
    let (access, refresh) = app.login("alice@example.com", "password123").await;

    let first = app
        .post_json_auth("/logout", json!({ "refresh": refresh.clone() }), &access)
        .await;
    assert_eq!(first.status(), StatusCode::RESET_CONTENT);

    let second = app
        .post_json_auth("/logout", json!({ "refresh": refresh }), &access)
        .await;
    assert_eq!(second.status(), StatusCode::RESET_CONTENT);
}

#[tokio::test]
async fn logout_with_garbage_token_is_bad_request() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;
    let (access, _) = app.login("alice@example.com", "password123").await;

    let response = app
        .post_json_auth("/logout", json!({ "refresh": "not-a-jwt" }), &access)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn access_token_is_not_a_valid_refresh_token() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;
    let (access, _) = app.login("alice@example.com", "password123").await;

    let response = app
        .post_json_auth("/logout", json!({ "refresh": access.clone() }), &access)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn revoking_one_session_leaves_others_valid() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;
    let (first_access, first_refresh) = app.login("alice@example.com", "password123").await;
    let (_, second_refresh) = app.login("alice@example.com", "password123").await;

    let response = app
        .post_json_auth(
            "/logout",
            json!({ "refresh": first_refresh.clone() }),
            &first_access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::RESET_CONTENT);

    assert!(app
        .state
        .auth_service
        .verify_refresh(&first_refresh)
        .await
        .is_err());
    assert!(app
        .state
        .auth_service
        .verify_refresh(&second_refresh)
        .await
        .is_ok());
}

#[tokio::test]
async fn access_token_still_works_after_logout() {
    let app = TestApp::spawn().await;
    app.register_user("alice@example.com", "alice", "password123")
        .await;
    let (access, refresh) = app.login("alice@example.com", "password123").await;

    let response = app
        .post_json_auth("/logout", json!({ "refresh": refresh }), &access)
        .await;
    assert_eq!(response.status(), StatusCode::RESET_CONTENT);

    // Access tokens are validated by signature and expiry only; they age
    // out rather than being revoked.
    let response = app.get_auth("/user-details", &access).await;
    assert_eq!(response.status(), StatusCode::OK);
}
