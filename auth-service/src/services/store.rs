//! Repository boundary for the relational user/group/permission store.
//!
//! The service layer only ever talks to the [`Store`] trait; the production
//! implementation is [`PgStore`](crate::services::PgStore), and
//! [`MemoryStore`] backs the test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    Group, GroupProfile, GroupRecord, Permission, User, ADMIN_CODENAME, USER_RESOURCE,
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), anyhow::Error>;

    // users
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, anyhow::Error>;
    async fn insert_user(&self, user: &User) -> Result<(), anyhow::Error>;
    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error>;
    /// Full-row update keyed by user_id. Returns false if the user is absent.
    async fn update_user(&self, user: &User) -> Result<bool, anyhow::Error>;
    async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, anyhow::Error>;
    async fn touch_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error>;
    async fn set_user_active(&self, user_id: Uuid, active: bool) -> Result<bool, anyhow::Error>;

    // memberships and direct grants
    async fn user_group_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, anyhow::Error>;
    /// Replace the user's memberships with exactly `group_ids`, atomically.
    async fn replace_user_groups(
        &self,
        user_id: Uuid,
        group_ids: &[Uuid],
    ) -> Result<(), anyhow::Error>;
    async fn user_direct_permissions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Permission>, anyhow::Error>;
    /// True iff the user belongs to at least one group whose profile row
    /// exists and whose permission set contains `codename`.
    async fn user_has_group_codename(
        &self,
        user_id: Uuid,
        codename: &str,
    ) -> Result<bool, anyhow::Error>;

    // groups
    async fn find_group_by_id(&self, group_id: Uuid) -> Result<Option<Group>, anyhow::Error>;
    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, anyhow::Error>;
    /// Insert group, profile and permission set in one transaction.
    async fn insert_group(
        &self,
        group: &Group,
        profile: &GroupProfile,
        permission_ids: &[Uuid],
    ) -> Result<(), anyhow::Error>;
    /// Update name/activation and, when provided, fully replace the
    /// permission set, in one transaction.
    async fn update_group(
        &self,
        group: &Group,
        is_active: bool,
        permission_ids: Option<&[Uuid]>,
    ) -> Result<(), anyhow::Error>;
    async fn set_group_active(&self, group_id: Uuid, active: bool) -> Result<bool, anyhow::Error>;
    async fn group_record(&self, group_id: Uuid) -> Result<Option<GroupRecord>, anyhow::Error>;
    async fn list_group_records(&self) -> Result<Vec<GroupRecord>, anyhow::Error>;

    // permissions
    async fn list_permissions(&self) -> Result<Vec<Permission>, anyhow::Error>;
    async fn find_permissions_by_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Permission>, anyhow::Error>;
    async fn permissions_for_resource(
        &self,
        resource: &str,
    ) -> Result<Vec<Permission>, anyhow::Error>;
    async fn find_permission_by_codename(
        &self,
        resource: &str,
        codename: &str,
    ) -> Result<Option<Permission>, anyhow::Error>;
}

/// The permission catalogue seeded into a fresh store: the reserved baseline
/// CRUD entries plus the dashboard codenames, all on the user resource.
pub fn seed_permissions() -> Vec<Permission> {
    [
        ("add_user", "Can add user"),
        ("change_user", "Can change user"),
        ("delete_user", "Can delete user"),
        ("view_user", "Can view user"),
        (ADMIN_CODENAME, "Can manage groups and users"),
        ("support", "Access to the support dashboard"),
        ("management", "Access to the management dashboard"),
        ("billing", "Access to the billing dashboard"),
        ("finance", "Access to the finance dashboard"),
        ("infrastructure", "Access to the infrastructure dashboard"),
        ("installation", "Access to the installation dashboard"),
        ("marketing", "Access to the marketing dashboard"),
        ("sales", "Access to the sales dashboard"),
        ("it", "Access to the IT dashboards"),
    ]
    .iter()
    .map(|(codename, name)| Permission::new(name, codename, USER_RESOURCE))
    .collect()
}

#[derive(Default)]
struct MemoryInner {
    users: HashMap<Uuid, User>,
    groups: HashMap<Uuid, Group>,
    profiles: HashMap<Uuid, GroupProfile>,
    permissions: HashMap<Uuid, Permission>,
    group_perms: HashMap<Uuid, HashSet<Uuid>>,
    user_groups: HashMap<Uuid, HashSet<Uuid>>,
    user_perms: HashMap<Uuid, HashSet<Uuid>>,
}

/// In-memory store. A single mutex serializes every operation, so each
/// multi-entity write is observed atomically, matching the transactional
/// contract of the Postgres implementation.
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the permission catalogue seeded.
    pub fn new() -> Self {
        let mut inner = MemoryInner::default();
        for perm in seed_permissions() {
            inner.permissions.insert(perm.perm_id, perm);
        }
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Directly grant a permission to a user, bypassing administration.
    /// Test-setup hook.
    pub fn grant_user_permission(&self, user_id: Uuid, perm_id: Uuid) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        inner.user_perms.entry(user_id).or_default().insert(perm_id);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, anyhow::Error> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory store mutex poisoned: {}", e))
    }

    fn record_for(inner: &MemoryInner, group_id: Uuid) -> Option<GroupRecord> {
        let group = inner.groups.get(&group_id)?.clone();
        let is_active = inner.profiles.get(&group_id).map(|p| p.is_active)?;
        let mut permissions: Vec<Permission> = inner
            .group_perms
            .get(&group_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.permissions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        permissions.sort_by(|a, b| a.codename.cmp(&b.codename));
        Some(GroupRecord {
            group,
            is_active,
            permissions,
        })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        inner.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error> {
        let inner = self.lock()?;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> Result<bool, anyhow::Error> {
        let mut inner = self.lock()?;
        if !inner.users.contains_key(&user.user_id) {
            return Ok(false);
        }
        inner.users.insert(user.user_id, user.clone());
        Ok(true)
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, anyhow::Error> {
        let mut inner = self.lock()?;
        match inner.users.get_mut(&user_id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn set_user_active(&self, user_id: Uuid, active: bool) -> Result<bool, anyhow::Error> {
        let mut inner = self.lock()?;
        match inner.users.get_mut(&user_id) {
            Some(user) => {
                user.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn user_group_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, anyhow::Error> {
        let inner = self.lock()?;
        let mut ids: Vec<Uuid> = inner
            .user_groups
            .get(&user_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        Ok(ids)
    }

    async fn replace_user_groups(
        &self,
        user_id: Uuid,
        group_ids: &[Uuid],
    ) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        inner
            .user_groups
            .insert(user_id, group_ids.iter().copied().collect());
        Ok(())
    }

    async fn user_direct_permissions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Permission>, anyhow::Error> {
        let inner = self.lock()?;
        let mut perms: Vec<Permission> = inner
            .user_perms
            .get(&user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.permissions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        perms.sort_by(|a, b| a.codename.cmp(&b.codename));
        Ok(perms)
    }

    async fn user_has_group_codename(
        &self,
        user_id: Uuid,
        codename: &str,
    ) -> Result<bool, anyhow::Error> {
        let inner = self.lock()?;
        let Some(group_ids) = inner.user_groups.get(&user_id) else {
            return Ok(false);
        };
        for group_id in group_ids {
            // The profile row must exist; its activation flag is not consulted.
            if !inner.profiles.contains_key(group_id) {
                continue;
            }
            let Some(perm_ids) = inner.group_perms.get(group_id) else {
                continue;
            };
            if perm_ids
                .iter()
                .filter_map(|id| inner.permissions.get(id))
                .any(|p| p.codename == codename)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn find_group_by_id(&self, group_id: Uuid) -> Result<Option<Group>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner.groups.get(&group_id).cloned())
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner.groups.values().find(|g| g.name == name).cloned())
    }

    async fn insert_group(
        &self,
        group: &Group,
        profile: &GroupProfile,
        permission_ids: &[Uuid],
    ) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        inner.groups.insert(group.group_id, group.clone());
        inner.profiles.insert(group.group_id, profile.clone());
        inner
            .group_perms
            .insert(group.group_id, permission_ids.iter().copied().collect());
        Ok(())
    }

    async fn update_group(
        &self,
        group: &Group,
        is_active: bool,
        permission_ids: Option<&[Uuid]>,
    ) -> Result<(), anyhow::Error> {
        let mut inner = self.lock()?;
        inner.groups.insert(group.group_id, group.clone());
        inner
            .profiles
            .insert(group.group_id, GroupProfile::new(group.group_id, is_active));
        if let Some(ids) = permission_ids {
            inner
                .group_perms
                .insert(group.group_id, ids.iter().copied().collect());
        }
        Ok(())
    }

    async fn set_group_active(&self, group_id: Uuid, active: bool) -> Result<bool, anyhow::Error> {
        let mut inner = self.lock()?;
        match inner.profiles.get_mut(&group_id) {
            Some(profile) => {
                profile.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn group_record(&self, group_id: Uuid) -> Result<Option<GroupRecord>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(Self::record_for(&inner, group_id))
    }

    async fn list_group_records(&self) -> Result<Vec<GroupRecord>, anyhow::Error> {
        let inner = self.lock()?;
        let mut records: Vec<GroupRecord> = inner
            .groups
            .keys()
            .filter_map(|id| Self::record_for(&inner, *id))
            .collect();
        records.sort_by(|a, b| a.group.name.cmp(&b.group.name));
        Ok(records)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, anyhow::Error> {
        let inner = self.lock()?;
        let mut perms: Vec<Permission> = inner.permissions.values().cloned().collect();
        perms.sort_by(|a, b| a.codename.cmp(&b.codename));
        Ok(perms)
    }

    async fn find_permissions_by_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Permission>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| inner.permissions.get(id).cloned())
            .collect())
    }

    async fn permissions_for_resource(
        &self,
        resource: &str,
    ) -> Result<Vec<Permission>, anyhow::Error> {
        let inner = self.lock()?;
        let mut perms: Vec<Permission> = inner
            .permissions
            .values()
            .filter(|p| p.resource == resource)
            .cloned()
            .collect();
        perms.sort_by(|a, b| a.codename.cmp(&b.codename));
        Ok(perms)
    }

    async fn find_permission_by_codename(
        &self,
        resource: &str,
        codename: &str,
    ) -> Result<Option<Permission>, anyhow::Error> {
        let inner = self.lock()?;
        Ok(inner
            .permissions
            .values()
            .find(|p| p.resource == resource && p.codename == codename)
            .cloned())
    }
}
