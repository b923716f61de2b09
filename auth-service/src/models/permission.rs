//! Permission model - (codename, resource) pairs grantable to users and groups.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The resource type all RBAC permissions in this service are scoped to.
pub const USER_RESOURCE: &str = "user";

/// Codename granting group/user administration rights.
pub const ADMIN_CODENAME: &str = "admin";

/// Baseline CRUD codenames auto-created for the user resource. They exist in
/// the store but are never listed as assignable RBAC permissions.
pub const RESERVED_USER_CODENAMES: [&str; 4] =
    ["add_user", "change_user", "delete_user", "view_user"];

/// Permission entity. Codename is unique within a resource type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub perm_id: Uuid,
    pub name: String,
    pub codename: String,
    pub resource: String,
}

impl Permission {
    pub fn new(name: &str, codename: &str, resource: &str) -> Self {
        Self {
            perm_id: Uuid::new_v4(),
            name: name.to_string(),
            codename: codename.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Whether this is framework noise rather than an assignable RBAC entry.
    pub fn is_reserved(&self) -> bool {
        self.resource == USER_RESOURCE && RESERVED_USER_CODENAMES.contains(&self.codename.as_str())
    }
}

/// Permission response for API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub name: String,
    pub codename: String,
}

impl From<Permission> for PermissionResponse {
    fn from(p: Permission) -> Self {
        Self {
            id: p.perm_id,
            name: p.name,
            codename: p.codename,
        }
    }
}
