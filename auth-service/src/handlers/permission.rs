use axum::{extract::State, Json};

use crate::{middleware::AuthUser, models::PermissionResponse, AppState};
use service_core::error::AppError;

/// The assignable permission catalogue: user-resource entries minus the
/// reserved baseline CRUD codenames.
#[utoipa::path(
    get,
    path = "/permissions",
    responses(
        (status = 200, description = "Assignable permissions", body = [PermissionResponse]),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Permissions"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<PermissionResponse>>, AppError> {
    let caller = state.auth_service.current_user(&claims).await?;
    state.admin_service.ensure_admin(&caller).await?;

    let permissions = state.admin_service.list_assignable_permissions().await?;
    Ok(Json(permissions.into_iter().map(Into::into).collect()))
}
