//! User model - email is the login key, username is display identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{GroupResponse, PermissionResponse};

/// User entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new user. Registration always yields a plain active account;
    /// staff and superuser are only ever set through administration.
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            username,
            password_hash,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login: None,
            created_utc: Utc::now(),
        }
    }

    /// Convert to sanitized response (no credential material).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// User response for API (without sensitive fields).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.user_id,
            username: u.username,
            email: u.email,
            is_active: u.is_active,
            is_staff: u.is_staff,
            is_superuser: u.is_superuser,
        }
    }
}

/// Full user detail: the sanitized user plus group read-models and the
/// directly-assigned permissions scoped to the user resource.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetailsResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub permissions: Vec<PermissionResponse>,
    pub groups: Vec<GroupResponse>,
}
