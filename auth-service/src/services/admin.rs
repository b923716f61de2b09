use crate::{
    dtos::admin::{CreateGroupRequest, SetUserGroupsRequest, UpdateGroupRequest, UpdateUserRequest},
    models::{
        Group, GroupProfile, GroupRecord, Permission, User, UserResponse, USER_RESOURCE,
    },
    services::{
        guard::{is_authorized_admin, is_reserved_admin_group_name},
        ServiceError, Store,
    },
};
use std::sync::Arc;
use uuid::Uuid;

/// Group, user and permission administration. Every operation is gated on
/// the caller passing the admin check.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn ensure_admin(&self, caller: &User) -> Result<(), ServiceError> {
        let allowed = is_authorized_admin(self.store.as_ref(), Some(caller))
            .await
            .map_err(ServiceError::Storage)?;
        if allowed {
            Ok(())
        } else {
            Err(ServiceError::Forbidden)
        }
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupRecord>, ServiceError> {
        self.store
            .list_group_records()
            .await
            .map_err(ServiceError::Storage)
    }

    pub async fn get_group(&self, group_id: Uuid) -> Result<GroupRecord, ServiceError> {
        self.store
            .group_record(group_id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or_else(|| ServiceError::NotFound("Group".to_string()))
    }

    /// Create a group with its activation profile and permission set.
    ///
    /// The reserved name grants the entire permission catalogue, reserved
    /// baseline codenames included, regardless of the ids in the request.
    pub async fn create_group(&self, req: CreateGroupRequest) -> Result<GroupRecord, ServiceError> {
        if self
            .store
            .find_group_by_name(&req.name)
            .await
            .map_err(ServiceError::Storage)?
            .is_some()
        {
            return Err(ServiceError::Validation(
                "A group with this name already exists".to_string(),
            ));
        }

        let permission_ids = if is_reserved_admin_group_name(&req.name) {
            self.store
                .list_permissions()
                .await
                .map_err(ServiceError::Storage)?
                .into_iter()
                .map(|p| p.perm_id)
                .collect()
        } else {
            self.resolve_permission_ids(&req.permissions).await?
        };

        let group = Group::new(req.name);
        let profile = GroupProfile::new(group.group_id, req.is_active);

        self.store
            .insert_group(&group, &profile, &permission_ids)
            .await
            .map_err(ServiceError::Storage)?;

        tracing::info!(group_id = %group.group_id, name = %group.name, "Group created");

        self.get_group(group.group_id).await
    }

    /// Partial update. A provided permission list fully replaces the set.
    pub async fn update_group(
        &self,
        group_id: Uuid,
        req: UpdateGroupRequest,
    ) -> Result<GroupRecord, ServiceError> {
        let record = self.get_group(group_id).await?;
        let mut group = record.group;

        if let Some(name) = req.name {
            if name != group.name {
                if self
                    .store
                    .find_group_by_name(&name)
                    .await
                    .map_err(ServiceError::Storage)?
                    .is_some()
                {
                    return Err(ServiceError::Validation(
                        "A group with this name already exists".to_string(),
                    ));
                }
                group.name = name;
            }
        }

        let is_active = req.is_active.unwrap_or(record.is_active);

        let permission_ids = match req.permissions {
            Some(ids) => Some(self.resolve_permission_ids(&ids).await?),
            None => None,
        };

        self.store
            .update_group(&group, is_active, permission_ids.as_deref())
            .await
            .map_err(ServiceError::Storage)?;

        self.get_group(group_id).await
    }

    /// Soft delete: flips the profile's activation flag, never removes rows.
    pub async fn deactivate_group(&self, group_id: Uuid) -> Result<(), ServiceError> {
        let found = self
            .store
            .set_group_active(group_id, false)
            .await
            .map_err(ServiceError::Storage)?;
        if !found {
            return Err(ServiceError::NotFound("Group".to_string()));
        }

        tracing::info!(group_id = %group_id, "Group deactivated");

        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        Ok(self
            .store
            .list_users()
            .await
            .map_err(ServiceError::Storage)?
            .into_iter()
            .map(UserResponse::from)
            .collect())
    }

    pub async fn update_user(
        &self,
        user_id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        if let Some(username) = req.username {
            if username != user.username {
                if self
                    .store
                    .find_user_by_username(&username)
                    .await
                    .map_err(ServiceError::Storage)?
                    .is_some()
                {
                    return Err(ServiceError::Validation(
                        "A user with this username already exists".to_string(),
                    ));
                }
                user.username = username;
            }
        }

        if let Some(email) = req.email {
            if !email.eq_ignore_ascii_case(&user.email) {
                if self
                    .store
                    .find_user_by_email(&email)
                    .await
                    .map_err(ServiceError::Storage)?
                    .is_some()
                {
                    return Err(ServiceError::Validation(
                        "A user with this email already exists".to_string(),
                    ));
                }
                user.email = email;
            }
        }

        if let Some(is_active) = req.is_active {
            user.is_active = is_active;
        }

        self.store
            .update_user(&user)
            .await
            .map_err(ServiceError::Storage)?;

        Ok(user.sanitized())
    }

    pub async fn deactivate_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let found = self
            .store
            .set_user_active(user_id, false)
            .await
            .map_err(ServiceError::Storage)?;
        if !found {
            return Err(ServiceError::NotFound("User".to_string()));
        }

        tracing::info!(user_id = %user_id, "User deactivated");

        Ok(())
    }

    /// Replace a user's memberships with exactly the requested groups.
    ///
    /// An empty list clears all memberships. Any unknown group id fails
    /// the whole request and leaves memberships untouched.
    pub async fn set_user_groups(
        &self,
        user_id: Uuid,
        req: SetUserGroupsRequest,
    ) -> Result<usize, ServiceError> {
        self.store
            .find_user_by_id(user_id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;

        // Membership is a set: repeated ids collapse to one entry before
        // validation and insertion.
        let mut group_ids = req.group_ids;
        group_ids.sort_unstable();
        group_ids.dedup();

        for group_id in &group_ids {
            if self
                .store
                .find_group_by_id(*group_id)
                .await
                .map_err(ServiceError::Storage)?
                .is_none()
            {
                return Err(ServiceError::Validation(format!(
                    "Invalid group id: {}",
                    group_id
                )));
            }
        }

        self.store
            .replace_user_groups(user_id, &group_ids)
            .await
            .map_err(ServiceError::Storage)?;

        Ok(group_ids.len())
    }

    /// The assignable permission catalogue: user-resource entries minus the
    /// reserved baseline CRUD codenames.
    pub async fn list_assignable_permissions(&self) -> Result<Vec<Permission>, ServiceError> {
        Ok(self
            .store
            .permissions_for_resource(USER_RESOURCE)
            .await
            .map_err(ServiceError::Storage)?
            .into_iter()
            .filter(|p| !p.is_reserved())
            .collect())
    }

    async fn resolve_permission_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, ServiceError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let found = self
            .store
            .find_permissions_by_ids(&ids)
            .await
            .map_err(ServiceError::Storage)?;
        if found.len() != ids.len() {
            return Err(ServiceError::Validation(
                "One or more permission ids are invalid".to_string(),
            ));
        }
        Ok(found.into_iter().map(|p| p.perm_id).collect())
    }
}
