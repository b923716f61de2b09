//! Postgres implementation of the [`Store`] trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::models::{Group, GroupProfile, GroupRecord, Permission, User};
use crate::services::store::Store;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, anyhow::Error> {
        info!(max_connections = max_connections, "Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect: {}", e))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<(), anyhow::Error> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn permissions_for_group(&self, group_id: Uuid) -> Result<Vec<Permission>, anyhow::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.perm_id, p.name, p.codename, p.resource
            FROM permissions p
            JOIN group_permissions gp ON gp.perm_id = p.perm_id
            WHERE gp.group_id = $1
            ORDER BY p.codename
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load group permissions: {}", e))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Health check failed: {}", e))?;
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, username, password_hash, is_active, is_staff, is_superuser, last_login, created_utc
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to find user: {}", e))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, username, password_hash, is_active, is_staff, is_superuser, last_login, created_utc
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to find user by email: {}", e))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, anyhow::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, username, password_hash, is_active, is_staff, is_superuser, last_login, created_utc
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to find user by username: {}", e))
    }

    async fn insert_user(&self, user: &User) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, username, password_hash, is_active, is_staff, is_superuser, last_login, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.last_login)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to insert user: {}", e))?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, anyhow::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, username, password_hash, is_active, is_staff, is_superuser, last_login, created_utc
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))
    }

    async fn update_user(&self, user: &User) -> Result<bool, anyhow::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, username = $3, password_hash = $4, is_active = $5,
                is_staff = $6, is_superuser = $7, last_login = $8
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.last_login)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to update user: {}", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update password: {}", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update last login: {}", e))?;
        Ok(())
    }

    async fn set_user_active(&self, user_id: Uuid, active: bool) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("UPDATE users SET is_active = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set user active flag: {}", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_group_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, anyhow::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT group_id FROM user_groups WHERE user_id = $1 ORDER BY group_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load user groups: {}", e))
    }

    async fn replace_user_groups(
        &self,
        user_id: Uuid,
        group_ids: &[Uuid],
    ) -> Result<(), anyhow::Error> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to begin transaction: {}", e))?;

        sqlx::query("DELETE FROM user_groups WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to clear user groups: {}", e))?;

        for group_id in group_ids {
            sqlx::query("INSERT INTO user_groups (user_id, group_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(group_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to insert user group: {}", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to commit transaction: {}", e))?;
        Ok(())
    }

    async fn user_direct_permissions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Permission>, anyhow::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.perm_id, p.name, p.codename, p.resource
            FROM permissions p
            JOIN user_permissions up ON up.perm_id = p.perm_id
            WHERE up.user_id = $1
            ORDER BY p.codename
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load user permissions: {}", e))
    }

    async fn user_has_group_codename(
        &self,
        user_id: Uuid,
        codename: &str,
    ) -> Result<bool, anyhow::Error> {
        // The profile row must exist; its activation flag is not consulted.
        let found: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1
            FROM user_groups ug
            JOIN group_profiles pr ON pr.group_id = ug.group_id
            JOIN group_permissions gp ON gp.group_id = ug.group_id
            JOIN permissions p ON p.perm_id = gp.perm_id
            WHERE ug.user_id = $1 AND p.codename = $2
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(codename)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to check group codename: {}", e))?;
        Ok(found.is_some())
    }

    async fn find_group_by_id(&self, group_id: Uuid) -> Result<Option<Group>, anyhow::Error> {
        sqlx::query_as::<_, Group>(
            "SELECT group_id, name, created_utc FROM groups WHERE group_id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to find group: {}", e))
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, anyhow::Error> {
        sqlx::query_as::<_, Group>(
            "SELECT group_id, name, created_utc FROM groups WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to find group by name: {}", e))
    }

    async fn insert_group(
        &self,
        group: &Group,
        profile: &GroupProfile,
        permission_ids: &[Uuid],
    ) -> Result<(), anyhow::Error> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to begin transaction: {}", e))?;

        sqlx::query("INSERT INTO groups (group_id, name, created_utc) VALUES ($1, $2, $3)")
            .bind(group.group_id)
            .bind(&group.name)
            .bind(group.created_utc)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert group: {}", e))?;

        sqlx::query("INSERT INTO group_profiles (group_id, is_active) VALUES ($1, $2)")
            .bind(profile.group_id)
            .bind(profile.is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert group profile: {}", e))?;

        for perm_id in permission_ids {
            sqlx::query("INSERT INTO group_permissions (group_id, perm_id) VALUES ($1, $2)")
                .bind(group.group_id)
                .bind(perm_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to insert group permission: {}", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to commit transaction: {}", e))?;
        Ok(())
    }

    async fn update_group(
        &self,
        group: &Group,
        is_active: bool,
        permission_ids: Option<&[Uuid]>,
    ) -> Result<(), anyhow::Error> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to begin transaction: {}", e))?;

        sqlx::query("UPDATE groups SET name = $2 WHERE group_id = $1")
            .bind(group.group_id)
            .bind(&group.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update group: {}", e))?;

        sqlx::query("UPDATE group_profiles SET is_active = $2 WHERE group_id = $1")
            .bind(group.group_id)
            .bind(is_active)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update group profile: {}", e))?;

        if let Some(ids) = permission_ids {
            sqlx::query("DELETE FROM group_permissions WHERE group_id = $1")
                .bind(group.group_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to clear group permissions: {}", e))?;

            for perm_id in ids {
                sqlx::query("INSERT INTO group_permissions (group_id, perm_id) VALUES ($1, $2)")
                    .bind(group.group_id)
                    .bind(perm_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to insert group permission: {}", e))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to commit transaction: {}", e))?;
        Ok(())
    }

    async fn set_group_active(&self, group_id: Uuid, active: bool) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("UPDATE group_profiles SET is_active = $2 WHERE group_id = $1")
            .bind(group_id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set group active flag: {}", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn group_record(&self, group_id: Uuid) -> Result<Option<GroupRecord>, anyhow::Error> {
        let row: Option<(Uuid, String, DateTime<Utc>, bool)> = sqlx::query_as(
            r#"
            SELECT g.group_id, g.name, g.created_utc, pr.is_active
            FROM groups g
            JOIN group_profiles pr ON pr.group_id = g.group_id
            WHERE g.group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load group: {}", e))?;

        let Some((group_id, name, created_utc, is_active)) = row else {
            return Ok(None);
        };

        let permissions = self.permissions_for_group(group_id).await?;

        Ok(Some(GroupRecord {
            group: Group {
                group_id,
                name,
                created_utc,
            },
            is_active,
            permissions,
        }))
    }

    async fn list_group_records(&self) -> Result<Vec<GroupRecord>, anyhow::Error> {
        let rows: Vec<(Uuid, String, DateTime<Utc>, bool)> = sqlx::query_as(
            r#"
            SELECT g.group_id, g.name, g.created_utc, pr.is_active
            FROM groups g
            JOIN group_profiles pr ON pr.group_id = g.group_id
            ORDER BY g.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list groups: {}", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for (group_id, name, created_utc, is_active) in rows {
            let permissions = self.permissions_for_group(group_id).await?;
            records.push(GroupRecord {
                group: Group {
                    group_id,
                    name,
                    created_utc,
                },
                is_active,
                permissions,
            });
        }
        Ok(records)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, anyhow::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT perm_id, name, codename, resource FROM permissions ORDER BY codename",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list permissions: {}", e))
    }

    async fn find_permissions_by_ids(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Permission>, anyhow::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT perm_id, name, codename, resource FROM permissions WHERE perm_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load permissions: {}", e))
    }

    async fn permissions_for_resource(
        &self,
        resource: &str,
    ) -> Result<Vec<Permission>, anyhow::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT perm_id, name, codename, resource
            FROM permissions
            WHERE resource = $1
            ORDER BY codename
            "#,
        )
        .bind(resource)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load permissions for resource: {}", e))
    }

    async fn find_permission_by_codename(
        &self,
        resource: &str,
        codename: &str,
    ) -> Result<Option<Permission>, anyhow::Error> {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT perm_id, name, codename, resource
            FROM permissions
            WHERE resource = $1 AND codename = $2
            "#,
        )
        .bind(resource)
        .bind(codename)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to find permission: {}", e))
    }
}
