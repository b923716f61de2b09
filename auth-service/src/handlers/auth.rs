//! Authentication handlers: registration, the token pair lifecycle, and
//! the stateless password-reset flow.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    dtos::auth::{
        LoginRequest, LogoutRequest, MessageResponse, PasswordResetConfirmRequest,
        PasswordResetRequest, RegisterRequest, TokenPairResponse,
    },
    middleware::AuthUser,
    models::{UserDetailsResponse, UserResponse},
    utils::ValidatedJson,
    AppState,
};
use service_core::error::AppError;

/// Register a new user account.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation error or duplicate email/username")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.auth_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(user.sanitized())))
}

/// Authenticate and receive an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPairResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let tokens = state.auth_service.login(req).await?;
    Ok(Json(tokens))
}

/// Revoke the presented refresh token.
#[utoipa::path(
    post,
    path = "/logout",
    request_body = LogoutRequest,
    responses(
        (status = 205, description = "Refresh token revoked"),
        (status = 400, description = "Invalid token"),
        (status = 401, description = "Missing or invalid access token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LogoutRequest>,
) -> Result<StatusCode, AppError> {
    state.auth_service.logout(req).await?;
    Ok(StatusCode::RESET_CONTENT)
}

/// The caller's profile, group memberships and assigned permissions.
#[utoipa::path(
    get,
    path = "/user-details",
    responses(
        (status = 200, description = "User details", body = UserDetailsResponse),
        (status = 401, description = "Missing or invalid access token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn user_details(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserDetailsResponse>, AppError> {
    let user = state.auth_service.current_user(&claims).await?;
    let details = state.auth_service.user_details(&user).await?;
    Ok(Json(details))
}

/// Request a password-reset email.
#[utoipa::path(
    post,
    path = "/password_reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 400, description = "Email not found")
    ),
    tag = "Auth"
)]
pub async fn password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth_service.request_reset(req).await?;
    Ok(Json(MessageResponse {
        message: "Password reset email has been sent".to_string(),
    }))
}

/// Complete a password reset with the emailed uid/token pair.
#[utoipa::path(
    post,
    path = "/password_reset_confirm/{uid}/{token}",
    params(
        ("uid" = String, Path, description = "Encoded user id from the reset email"),
        ("token" = String, Path, description = "Reset token from the reset email")
    ),
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid token or mismatched passwords")
    ),
    tag = "Auth"
)]
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Path((uid, token)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirmRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth_service.confirm_reset(&uid, &token, req).await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}
