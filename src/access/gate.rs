use tracing::warn;

use crate::access::repo::UserProfile;
use crate::access::role::{is_admin_email, Role};
use crate::error::ApiError;
use crate::providers::auth::Principal;
use crate::state::AppState;

/// Outcome of a successful authorization: exactly one role plus the
/// profile it was derived from.
#[derive(Debug, Clone)]
pub struct Grant {
    pub role: Role,
    pub profile: UserProfile,
}

/// Maps a principal to its role and checks it against the resource's
/// requirement. Admin passes every requirement.
pub async fn authorize(
    state: &AppState,
    principal: &Principal,
    required: Option<Role>,
) -> Result<Grant, ApiError> {
    let profile = UserProfile::find_by_id(&state.db, principal.id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotProvisioned)?;

    if profile.disabled_at.is_some() {
        warn!(user_id = %principal.id, "disabled profile attempted access");
        return Err(ApiError::Forbidden);
    }

    let role = resolve_role(
        &state.config.admin_emails,
        &principal.email,
        &profile.user_type,
    )
    .ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!(
            "profile {} has unknown user_type {:?}",
            profile.id,
            profile.user_type
        ))
    })?;

    check_required(role, required)?;
    Ok(Grant { role, profile })
}

/// Pure role derivation: allow-listed emails are admin regardless of the
/// stored user type.
pub fn resolve_role(admin_emails: &[String], email: &str, user_type: &str) -> Option<Role> {
    if is_admin_email(admin_emails, email) {
        return Some(Role::Admin);
    }
    Role::parse(user_type)
}

pub fn check_required(role: Role, required: Option<Role>) -> Result<(), ApiError> {
    match required {
        None => Ok(()),
        Some(_) if role == Role::Admin => Ok(()),
        Some(req) if role == req => Ok(()),
        Some(_) => Err(ApiError::Forbidden),
    }
}
