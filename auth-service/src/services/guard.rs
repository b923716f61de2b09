use crate::models::{User, ADMIN_CODENAME};
use crate::services::store::Store;

/// True for the reserved group name that grants every permission on
/// creation. Matched case-insensitively.
pub fn is_reserved_admin_group_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(ADMIN_CODENAME)
}

/// Admin gate for the administration endpoints.
///
/// Staff and superusers pass outright. Everyone else passes only when
/// they belong to a group that both has a profile row and holds the
/// `admin` permission. The profile's activation flag is not consulted
/// here; deactivation hides a group from listings but does not strip
/// the gate.
pub async fn is_authorized_admin(
    store: &dyn Store,
    user: Option<&User>,
) -> Result<bool, anyhow::Error> {
    let Some(user) = user else {
        return Ok(false);
    };

    if user.is_staff || user.is_superuser {
        return Ok(true);
    }

    store
        .user_has_group_codename(user.user_id, ADMIN_CODENAME)
        .await
}
