use tracing::instrument;

use devpulse_core::ids::UserId;
use devpulse_core::{AdvancedSettings, EnrollError};
use devpulse_store::invites::Invite;
use devpulse_store::roles::{Role, RoleRepo};
use devpulse_store::users::UserRepo;
use devpulse_store::Database;

/// Role name that gates enrollment record creation.
pub const TRAINEE_ROLE_NAME: &str = "Trainee";
/// Role name whose holders sponsor the trainees they invite.
pub const MANAGER_ROLE_NAME: &str = "Manager";

/// Resolve the role the registrant will hold: the one pinned on the
/// invite, or the configured default when the invite carries none.
#[instrument(skip(db, invite, settings), fields(invite_id = %invite.id))]
pub fn resolve_role(
    db: &Database,
    invite: &Invite,
    settings: &AdvancedSettings,
) -> Result<Role, EnrollError> {
    let roles = RoleRepo::new(db.clone());
    let role = match &invite.role_id {
        Some(id) => roles.find(id)?,
        None => roles.find_by_type(&settings.default_role_type)?,
    };
    role.ok_or(EnrollError::RoleNotFound)
}

/// Resolve the manager linkage for the enrollment. Only an inviter whose
/// role name is exactly "Manager" becomes the sponsor; anyone else (or a
/// missing inviter) yields no linkage.
#[instrument(skip(db, invite), fields(invite_id = %invite.id))]
pub fn resolve_sponsor(
    db: &Database,
    invite: &Invite,
) -> Result<Option<Vec<UserId>>, EnrollError> {
    let Some(inviter_id) = &invite.inviter_id else {
        return Ok(None);
    };
    let Some(inviter) = UserRepo::new(db.clone()).find(inviter_id)? else {
        return Ok(None);
    };
    let role = RoleRepo::new(db.clone()).find(&inviter.role_id)?;
    match role {
        Some(role) if role.name == MANAGER_ROLE_NAME => Ok(Some(vec![inviter_id.clone()])),
        _ => Ok(None),
    }
}
