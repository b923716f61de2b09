//! User administration handlers. Every route is gated on the admin check.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    dtos::{
        admin::{SetUserGroupsRequest, StatusResponse, UpdateUserRequest},
        auth::MessageResponse,
    },
    middleware::AuthUser,
    models::UserResponse,
    utils::ValidatedJson,
    AppState,
};
use service_core::error::AppError;

/// List all user accounts.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    let users = state.admin_service.list_users().await?;
    Ok(Json(users))
}

/// Partially update a user's profile fields.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Duplicate email or username"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    let user = state.admin_service.update_user(id, req).await?;
    Ok(Json(user))
}

/// Soft-delete a user by flipping the activation flag.
#[utoipa::path(
    post,
    path = "/users/{id}/deactivate",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated", body = StatusResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    state.admin_service.deactivate_user(id).await?;
    Ok(Json(StatusResponse {
        status: "user deactivated".to_string(),
    }))
}

/// Replace a user's group memberships. An empty list clears them all;
/// any unknown group id fails the request and leaves memberships intact.
#[utoipa::path(
    post,
    path = "/users/{id}/add-to-group",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = SetUserGroupsRequest,
    responses(
        (status = 200, description = "Memberships replaced", body = MessageResponse),
        (status = 400, description = "Invalid group id"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn add_to_group(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SetUserGroupsRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    let count = state.admin_service.set_user_groups(id, req).await?;
    let message = if count == 0 {
        "all groups removed from user".to_string()
    } else {
        "user groups updated".to_string()
    };
    Ok(Json(MessageResponse { message }))
}
