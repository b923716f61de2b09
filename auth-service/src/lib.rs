pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::AuthConfig;
use crate::services::{
    AdminService, AuthService, EmailProvider, JwtService, Store, TokenBlacklist,
};
use service_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::user_details,
        handlers::auth::password_reset,
        handlers::auth::password_reset_confirm,
        handlers::group::list_groups,
        handlers::group::create_group,
        handlers::group::get_group,
        handlers::group::update_group,
        handlers::group::deactivate_group,
        handlers::user::list_users,
        handlers::user::update_user,
        handlers::user::deactivate_user,
        handlers::user::add_to_group,
        handlers::permission::list_permissions,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::LogoutRequest,
            dtos::auth::TokenPairResponse,
            dtos::auth::MessageResponse,
            dtos::auth::PasswordResetRequest,
            dtos::auth::PasswordResetConfirmRequest,
            dtos::admin::CreateGroupRequest,
            dtos::admin::UpdateGroupRequest,
            dtos::admin::SetUserGroupsRequest,
            dtos::admin::UpdateUserRequest,
            dtos::admin::StatusResponse,
            models::UserResponse,
            models::UserDetailsResponse,
            models::GroupResponse,
            models::PermissionResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token lifecycle"),
        (name = "Groups", description = "Group administration"),
        (name = "Users", description = "User administration"),
        (name = "Permissions", description = "Permission catalogue"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store: Arc<dyn Store>,
    pub email: Arc<dyn EmailProvider>,
    pub jwt: JwtService,
    pub blacklist: Arc<dyn TokenBlacklist>,
    pub auth_service: AuthService,
    pub admin_service: AdminService,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Everything behind the access-token gate.
    let protected = Router::new()
        .route("/user-details", get(handlers::auth::user_details))
        .route("/logout", post(handlers::auth::logout))
        .route(
            "/groups",
            get(handlers::group::list_groups).post(handlers::group::create_group),
        )
        .route(
            "/groups/:id",
            get(handlers::group::get_group).put(handlers::group::update_group),
        )
        .route(
            "/groups/:id/deactivate",
            post(handlers::group::deactivate_group),
        )
        .route("/users", get(handlers::user::list_users))
        .route("/users/:id", put(handlers::user::update_user))
        .route(
            "/users/:id/deactivate",
            post(handlers::user::deactivate_user),
        )
        .route("/users/:id/add-to-group", post(handlers::user::add_to_group))
        .route("/permissions", get(handlers::permission::list_permissions))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/password_reset", post(handlers::auth::password_reset))
        .route(
            "/password_reset_confirm/:uid/:token",
            post(handlers::auth::password_reset_confirm),
        )
        .merge(protected)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|o| o.parse::<HeaderValue>().ok())
                        .collect::<Vec<HeaderValue>>(),
                )
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::ServiceUnavailable
    })?;

    state.blacklist.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Blacklist health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "checks": {
            "database": "up",
            "blacklist": "up"
        }
    })))
}
