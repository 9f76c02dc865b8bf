use tokio::task::JoinHandle;
use tracing::instrument;

use devpulse_core::ids::{CohortProgramId, RoleId, UserId};
use devpulse_core::mailer::InviteNotice;
use devpulse_core::EnrollError;
use devpulse_mailer::{DeliveryOutcome, InviteNotifier};
use devpulse_store::invites::{Invite, InviteRepo, NewInvite};
use devpulse_store::roles::RoleRepo;
use devpulse_store::users::UserRepo;
use devpulse_store::Database;

/// An invitation as submitted by an authenticated inviter.
#[derive(Clone, Debug, Default)]
pub struct InviteRequest {
    pub email: String,
    pub role_id: Option<RoleId>,
    pub inviter_id: Option<UserId>,
    pub cohort_program_schedule: Option<CohortProgramId>,
}

/// Creates invitations and hands delivery to the notifier.
pub struct InviteService {
    db: Database,
    notifier: InviteNotifier,
}

impl InviteService {
    pub fn new(db: Database, notifier: InviteNotifier) -> Self {
        Self { db, notifier }
    }

    /// Create an invite and start email delivery in the background. The
    /// invite is returned immediately; the handle resolves to the delivery
    /// outcome and may be dropped by callers that do not care.
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub fn create(
        &self,
        request: &InviteRequest,
    ) -> Result<(Invite, JoinHandle<DeliveryOutcome>), EnrollError> {
        if request.email.trim().is_empty() {
            return Err(EnrollError::MissingEmail);
        }
        let email = request.email.to_lowercase();

        if UserRepo::new(self.db.clone()).find_by_email(&email)?.is_some() {
            return Err(EnrollError::UserExists(email));
        }
        let invites = InviteRepo::new(self.db.clone());
        if invites.find_by_email(&email)?.is_some() {
            return Err(EnrollError::InviteAlreadySent(email));
        }

        let invite = invites.create(&NewInvite {
            email,
            role_id: request.role_id.clone(),
            inviter_id: request.inviter_id.clone(),
            cohort_program_schedule: request.cohort_program_schedule.clone(),
        })?;

        let notice = self.notice_for(&invite)?;
        let delivery = self.notifier.dispatch(notice);
        Ok((invite, delivery))
    }

    /// Assemble the notice for the invite email: the inviter's name and
    /// the pinned role's display name, where they resolve.
    fn notice_for(&self, invite: &Invite) -> Result<InviteNotice, EnrollError> {
        let mut notice = InviteNotice::bare(invite.email.clone());

        if let Some(inviter_id) = &invite.inviter_id {
            if let Some(inviter) = UserRepo::new(self.db.clone()).find(inviter_id)? {
                notice.inviter_first_name = inviter.first_name;
                notice.inviter_last_name = inviter.last_name;
            }
        }
        if let Some(role_id) = &invite.role_id {
            notice.role_name = RoleRepo::new(self.db.clone())
                .find(role_id)?
                .map(|role| role.name);
        }

        Ok(notice)
    }
}
