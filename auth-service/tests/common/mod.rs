//! Shared harness for auth-service integration tests.
//!
//! Runs the full router against in-memory backends, so no external
//! services are needed.

#![allow(dead_code)]

use auth_service::{
    build_router,
    config::{
        AuthConfig, DatabaseConfig, Environment, JwtConfig, RedisConfig, ResetConfig,
        SecurityConfig, SmtpConfig,
    },
    services::{
        AdminService, AuthService, JwtService, MemoryBlacklist, MemoryStore, MockEmailService,
        ResetTokenGenerator, Store,
    },
    AppState,
};
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub email: Arc<MockEmailService>,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = test_config();

        let store = Arc::new(MemoryStore::new());
        let blacklist = Arc::new(MemoryBlacklist::new());
        let email = Arc::new(MockEmailService::new());

        let jwt = JwtService::new(&config.jwt).expect("Failed to create JWT service");
        let reset = ResetTokenGenerator::new(&config.jwt.secret, &config.reset);

        let auth_service = AuthService::new(
            store.clone(),
            email.clone(),
            jwt.clone(),
            blacklist.clone(),
            reset,
        );
        let admin_service = AdminService::new(store.clone());

        let state = AppState {
            config,
            store: store.clone(),
            email: email.clone(),
            jwt,
            blacklist,
            auth_service,
            admin_service,
        };

        let router = build_router(state.clone())
            .await
            .expect("Failed to build router");

        Self {
            router,
            store,
            email,
            state,
        }
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response<Body> {
        self.request("POST", path, Some(body), None).await
    }

    pub async fn post_json_auth(&self, path: &str, body: Value, token: &str) -> Response<Body> {
        self.request("POST", path, Some(body), Some(token)).await
    }

    pub async fn put_json_auth(&self, path: &str, body: Value, token: &str) -> Response<Body> {
        self.request("PUT", path, Some(body), Some(token)).await
    }

    pub async fn get(&self, path: &str) -> Response<Body> {
        self.request("GET", path, None, None).await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Response<Body> {
        self.request("GET", path, None, Some(token)).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("Failed to build request"))
            .await
            .expect("Request failed")
    }

    /// Register a user through the API and return its id.
    pub async fn register_user(&self, email: &str, username: &str, password: &str) -> Value {
        let response = self
            .post_json(
                "/register",
                json!({ "email": email, "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        read_json(response).await
    }

    /// Log in through the API and return (access, refresh).
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .post_json("/login", json!({ "email": email, "password": password }))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        (
            body["access"].as_str().expect("missing access").to_string(),
            body["refresh"]
                .as_str()
                .expect("missing refresh")
                .to_string(),
        )
    }

    /// Register a user and promote them to staff directly in the store.
    pub async fn register_staff(&self, email: &str, username: &str, password: &str) {
        self.register_user(email, username, password).await;
        let mut user = self
            .store
            .find_user_by_email(email)
            .await
            .expect("store error")
            .expect("user missing");
        user.is_staff = true;
        self.store.update_user(&user).await.expect("store error");
    }
}

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "auth-service".to_string(),
        service_version: "test".to_string(),
        log_level: "warn".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            user: "test".to_string(),
            password: "test".to_string(),
            from_email: "noreply@example.com".to_string(),
        },
        reset: ResetConfig {
            timeout_seconds: 3600,
            frontend_base_url: "http://localhost:3000".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body was not valid JSON")
}
