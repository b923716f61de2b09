//! Group model - named permission collections plus the one-to-one activation
//! profile that wraps each group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Permission, PermissionResponse};

/// Group entity. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub group_id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String) -> Self {
        Self {
            group_id: Uuid::new_v4(),
            name,
            created_utc: Utc::now(),
        }
    }
}

/// One-to-one wrapper carrying the soft activation flag. Deactivation flips
/// the flag; the group itself is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupProfile {
    pub group_id: Uuid,
    pub is_active: bool,
}

impl GroupProfile {
    pub fn new(group_id: Uuid, is_active: bool) -> Self {
        Self {
            group_id,
            is_active,
        }
    }
}

/// Group with its profile and resolved permission set, as read from the store.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub group: Group,
    pub is_active: bool,
    pub permissions: Vec<Permission>,
}

/// Group response for API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupResponse {
    pub group_id: Uuid,
    pub name: String,
    pub permissions: Vec<PermissionResponse>,
    pub is_active: bool,
}

impl From<GroupRecord> for GroupResponse {
    fn from(r: GroupRecord) -> Self {
        Self {
            group_id: r.group.group_id,
            name: r.group.name,
            permissions: r.permissions.into_iter().map(Into::into).collect(),
            is_active: r.is_active,
        }
    }
}
