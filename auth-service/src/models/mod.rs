//! Domain entities and their API read-models.

mod group;
mod permission;
mod user;

pub use group::{Group, GroupProfile, GroupRecord, GroupResponse};
pub use permission::{
    Permission, PermissionResponse, ADMIN_CODENAME, RESERVED_USER_CODENAMES, USER_RESOURCE,
};
pub use user::{User, UserDetailsResponse, UserResponse};
