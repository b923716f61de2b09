//! Group and user administration: CRUD, the reserved admin name, and
//! membership replacement semantics.

mod common;

use auth_service::services::Store;
use axum::http::StatusCode;
use common::{read_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn staff_token(app: &TestApp) -> String {
    app.register_staff("root@example.com", "root", "password123")
        .await;
    let (access, _) = app.login("root@example.com", "password123").await;
    access
}

fn permission_id(perms: &Value, codename: &str) -> Value {
    perms
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["codename"] == codename)
        .unwrap_or_else(|| panic!("permission {} not listed", codename))["id"]
        .clone()
}

#[tokio::test]
async fn create_and_fetch_group() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let perms = read_json(app.get_auth("/permissions", &access).await).await;
    let support_id = permission_id(&perms, "support");

    let response = app
        .post_json_auth(
            "/groups",
            json!({ "name": "support-team", "permissions": [support_id] }),
            &access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let group = read_json(response).await;
    assert_eq!(group["name"], "support-team");
    assert_eq!(group["is_active"], true);
    assert_eq!(group["permissions"].as_array().unwrap().len(), 1);
    assert_eq!(group["permissions"][0]["codename"], "support");

    let fetched = read_json(
        app.get_auth(&format!("/groups/{}", group["group_id"].as_str().unwrap()), &access)
            .await,
    )
    .await;
    assert_eq!(fetched["name"], "support-team");
}

#[tokio::test]
async fn duplicate_group_name_is_rejected() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    app.post_json_auth("/groups", json!({ "name": "ops" }), &access)
        .await;
    let response = app
        .post_json_auth("/groups", json!({ "name": "ops" }), &access)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_permission_id_is_rejected() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let response = app
        .post_json_auth(
            "/groups",
            json!({ "name": "ops", "permissions": [Uuid::new_v4()] }),
            &access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reserved_admin_name_grants_every_permission() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    // Case-insensitive match, and the requested permission list is ignored.
    let response = app
        .post_json_auth("/groups", json!({ "name": "Admin", "permissions": [] }), &access)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let group = read_json(response).await;

    let codenames: Vec<&str> = group["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["codename"].as_str().unwrap())
        .collect();
    assert!(codenames.contains(&"admin"));
    assert!(codenames.contains(&"add_user"));
    assert!(codenames.contains(&"support"));
    assert_eq!(codenames.len(), 14);
}

#[tokio::test]
async fn update_group_replaces_permission_set() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let perms = read_json(app.get_auth("/permissions", &access).await).await;
    let support_id = permission_id(&perms, "support");
    let billing_id = permission_id(&perms, "billing");

    let group = read_json(
        app.post_json_auth(
            "/groups",
            json!({ "name": "ops", "permissions": [support_id] }),
            &access,
        )
        .await,
    )
    .await;
    let group_id = group["group_id"].as_str().unwrap().to_string();

    let updated = read_json(
        app.put_json_auth(
            &format!("/groups/{}", group_id),
            json!({ "name": "operations", "permissions": [billing_id] }),
            &access,
        )
        .await,
    )
    .await;
    assert_eq!(updated["name"], "operations");
    assert_eq!(updated["permissions"].as_array().unwrap().len(), 1);
    assert_eq!(updated["permissions"][0]["codename"], "billing");
}

#[tokio::test]
async fn deactivate_group_flips_flag_without_deleting() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let group = read_json(
        app.post_json_auth("/groups", json!({ "name": "ops" }), &access)
            .await,
    )
    .await;
    let group_id = group["group_id"].as_str().unwrap().to_string();

    let response = app
        .post_json_auth(&format!("/groups/{}/deactivate", group_id), json!({}), &access)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "group deactivated");

    let fetched = read_json(app.get_auth(&format!("/groups/{}", group_id), &access).await).await;
    assert_eq!(fetched["is_active"], false);
}

#[tokio::test]
async fn deactivate_missing_group_is_not_found() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let response = app
        .post_json_auth(
            &format!("/groups/{}/deactivate", Uuid::new_v4()),
            json!({}),
            &access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn permission_listing_excludes_reserved_codenames() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let perms = read_json(app.get_auth("/permissions", &access).await).await;
    let codenames: Vec<&str> = perms
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["codename"].as_str().unwrap())
        .collect();

    for reserved in ["add_user", "change_user", "delete_user", "view_user"] {
        assert!(!codenames.contains(&reserved), "{} leaked", reserved);
    }
    assert!(codenames.contains(&"admin"));
    assert!(codenames.contains(&"support"));
}

#[tokio::test]
async fn empty_group_list_clears_memberships() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let group = read_json(
        app.post_json_auth("/groups", json!({ "name": "ops" }), &access)
            .await,
    )
    .await;

    app.register_user("bob@example.com", "bob", "password123")
        .await;
    let bob = app
        .store
        .find_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap();

    app.post_json_auth(
        &format!("/users/{}/add-to-group", bob.user_id),
        json!({ "group_ids": [group["group_id"]] }),
        &access,
    )
    .await;
    assert_eq!(app.store.user_group_ids(bob.user_id).await.unwrap().len(), 1);

    let response = app
        .post_json_auth(
            &format!("/users/{}/add-to-group", bob.user_id),
            json!({ "group_ids": [] }),
            &access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "all groups removed from user");
    assert!(app.store.user_group_ids(bob.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_group_ids_collapse_to_one_membership() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let group = read_json(
        app.post_json_auth("/groups", json!({ "name": "ops" }), &access)
            .await,
    )
    .await;

    app.register_user("bob@example.com", "bob", "password123")
        .await;
    let bob = app
        .store
        .find_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap();

    let response = app
        .post_json_auth(
            &format!("/users/{}/add-to-group", bob.user_id),
            json!({ "group_ids": [group["group_id"], group["group_id"]] }),
            &access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.user_group_ids(bob.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn repeated_permission_ids_collapse_on_group_create() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let perms = read_json(app.get_auth("/permissions", &access).await).await;
    let support_id = permission_id(&perms, "support");

    let response = app
        .post_json_auth(
            "/groups",
            json!({ "name": "ops", "permissions": [support_id.clone(), support_id] }),
            &access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let group = read_json(response).await;
    assert_eq!(group["permissions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_group_id_leaves_memberships_untouched() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    let group = read_json(
        app.post_json_auth("/groups", json!({ "name": "ops" }), &access)
            .await,
    )
    .await;

    app.register_user("bob@example.com", "bob", "password123")
        .await;
    let bob = app
        .store
        .find_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap();

    app.post_json_auth(
        &format!("/users/{}/add-to-group", bob.user_id),
        json!({ "group_ids": [group["group_id"]] }),
        &access,
    )
    .await;

    let response = app
        .post_json_auth(
            &format!("/users/{}/add-to-group", bob.user_id),
            json!({ "group_ids": [group["group_id"], Uuid::new_v4()] }),
            &access,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.user_group_ids(bob.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn admin_can_update_and_deactivate_users() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    app.register_user("bob@example.com", "bob", "password123")
        .await;
    let bob = app
        .store
        .find_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap();

    let updated = read_json(
        app.put_json_auth(
            &format!("/users/{}", bob.user_id),
            json!({ "username": "robert" }),
            &access,
        )
        .await,
    )
    .await;
    assert_eq!(updated["username"], "robert");

    let response = app
        .post_json_auth(&format!("/users/{}/deactivate", bob.user_id), json!({}), &access)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "user deactivated");

    // Deactivated accounts can no longer authenticate.
    let login = app
        .post_json(
            "/login",
            json!({ "email": "bob@example.com", "password": "password123" }),
        )
        .await;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_listing_includes_all_accounts() {
    let app = TestApp::spawn().await;
    let access = staff_token(&app).await;

    app.register_user("bob@example.com", "bob", "password123")
        .await;

    let users = read_json(app.get_auth("/users", &access).await).await;
    let usernames: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&"root"));
    assert!(usernames.contains(&"bob"));
}
