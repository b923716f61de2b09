//! Group administration handlers. Every route is gated on the admin check.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    dtos::admin::{CreateGroupRequest, StatusResponse, UpdateGroupRequest},
    middleware::AuthUser,
    models::GroupResponse,
    utils::ValidatedJson,
    AppState,
};
use service_core::error::AppError;

/// List all groups with their permission sets.
#[utoipa::path(
    get,
    path = "/groups",
    responses(
        (status = 200, description = "All groups", body = [GroupResponse]),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn list_groups(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    let records = state.admin_service.list_groups().await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Create a group. The reserved admin name grants every permission.
#[utoipa::path(
    post,
    path = "/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Duplicate name or invalid permission ids"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    let record = state.admin_service.create_group(req).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Fetch one group.
#[utoipa::path(
    get,
    path = "/groups/{id}",
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group", body = GroupResponse),
        (status = 404, description = "Group not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn get_group(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    let record = state.admin_service.get_group(id).await?;
    Ok(Json(record.into()))
}

/// Partially update a group; a provided permission list replaces the set.
#[utoipa::path(
    put,
    path = "/groups/{id}",
    params(("id" = Uuid, Path, description = "Group id")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = GroupResponse),
        (status = 400, description = "Duplicate name or invalid permission ids"),
        (status = 404, description = "Group not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    let record = state.admin_service.update_group(id, req).await?;
    Ok(Json(record.into()))
}

/// Soft-delete a group by flipping its activation flag.
#[utoipa::path(
    post,
    path = "/groups/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group deactivated", body = StatusResponse),
        (status = 404, description = "Group not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn deactivate_group(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    state.admin_service.deactivate_group(id).await?;
    Ok(Json(StatusResponse {
        status: "group deactivated".to_string(),
    }))
}
