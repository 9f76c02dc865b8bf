use chrono::{DateTime, Utc};
use tracing::instrument;

use devpulse_core::{AdvancedSettings, EnrollError};
use devpulse_store::enrollments::Enrollment;
use devpulse_store::invites::InviteRepo;
use devpulse_store::users::{NewUser, User, UserRepo};
use devpulse_store::Database;

use crate::enroll::EnrollmentWriter;
use crate::resolver;

/// The fields a registrant submits.
#[derive(Clone, Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Invitation-gated registration: only addresses holding a pending invite
/// may create an account.
pub struct Registrar {
    db: Database,
    settings: AdvancedSettings,
}

impl Registrar {
    pub fn new(db: Database, settings: AdvancedSettings) -> Self {
        Self { db, settings }
    }

    /// Register a new user. Validation failures surface before any row is
    /// written; the enrollment side is compensated by [`EnrollmentWriter`].
    #[instrument(skip(self, params), fields(username = %params.username))]
    pub fn register(
        &self,
        params: &Registration,
        now: DateTime<Utc>,
    ) -> Result<(User, Option<Enrollment>), EnrollError> {
        if !self.settings.allow_register {
            return Err(EnrollError::RegistrationDisabled);
        }
        if params.username.trim().is_empty() {
            return Err(EnrollError::MissingField("username"));
        }
        if params.email.trim().is_empty() {
            return Err(EnrollError::MissingField("email"));
        }
        if params.password.trim().is_empty() {
            return Err(EnrollError::MissingField("password"));
        }

        let email = params.email.to_lowercase();
        let invite = InviteRepo::new(self.db.clone())
            .find_by_email(&email)?
            .ok_or(EnrollError::NotInvited)?;
        let role = resolver::resolve_role(&self.db, &invite, &self.settings)?;

        let users = UserRepo::new(self.db.clone());
        if users.find_by_username(&params.username)?.is_some() {
            return Err(EnrollError::UsernameTaken);
        }
        if self.settings.unique_email && users.find_by_email(&email)?.is_some() {
            return Err(EnrollError::EmailTaken);
        }

        let new_user = NewUser {
            username: params.username.clone(),
            email,
            password: params.password.clone(),
            first_name: params.first_name.clone(),
            last_name: params.last_name.clone(),
            role_id: role.id.clone(),
        };
        EnrollmentWriter::new(self.db.clone()).provision_and_enroll(&new_user, &role, &invite, now)
    }
}
