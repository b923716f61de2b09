use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, message = "Group name is required"))]
    #[schema(example = "support")]
    pub name: String,

    /// Permission ids to grant. Ignored for the reserved admin name, which
    /// receives every permission.
    #[serde(default)]
    pub permissions: Vec<Uuid>,

    #[serde(default = "default_is_active")]
    #[schema(example = true)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, message = "Group name must not be empty"))]
    #[schema(example = "support")]
    pub name: Option<String>,

    /// When present, fully replaces the group's permission set.
    pub permissions: Option<Vec<Uuid>>,

    #[schema(example = true)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetUserGroupsRequest {
    /// The complete set of memberships. An empty list removes the user
    /// from every group.
    #[serde(default)]
    pub group_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Username must not be empty"))]
    #[schema(example = "johndoe")]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,

    #[schema(example = true)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "user deactivated")]
    pub status: String,
}
