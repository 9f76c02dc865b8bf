use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use devpulse_core::EnrollError;
use devpulse_store::enrollments::{Enrollment, EnrollmentRepo, NewEnrollment};
use devpulse_store::invites::Invite;
use devpulse_store::roles::Role;
use devpulse_store::users::{NewUser, User, UserRepo};
use devpulse_store::Database;

use crate::resolver;
use crate::selector;

/// Provisions the user account and, for trainees, the enrollment record
/// that places them in a cohort-program.
pub struct EnrollmentWriter {
    db: Database,
}

impl EnrollmentWriter {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the user, then the enrollment when the resolved role is
    /// Trainee. If enrollment fails after the user row was written, the
    /// user is deleted again so the address can retry registration from a
    /// clean slate.
    #[instrument(skip(self, new_user, role, invite), fields(username = %new_user.username, role = %role.name))]
    pub fn provision_and_enroll(
        &self,
        new_user: &NewUser,
        role: &Role,
        invite: &Invite,
        now: DateTime<Utc>,
    ) -> Result<(User, Option<Enrollment>), EnrollError> {
        let users = UserRepo::new(self.db.clone());
        let user = users.create(new_user)?;

        if role.name != resolver::TRAINEE_ROLE_NAME {
            return Ok((user, None));
        }

        match self.enroll(&user, invite, now) {
            Ok(enrollment) => Ok((user, Some(enrollment))),
            Err(err) => {
                if let Err(cleanup) = users.delete(&user.id) {
                    warn!(user_id = %user.id, error = %cleanup, "failed to roll back user after enrollment failure");
                }
                Err(err)
            }
        }
    }

    fn enroll(
        &self,
        user: &User,
        invite: &Invite,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, EnrollError> {
        let pairing = selector::select_cohort_program(
            &self.db,
            invite.cohort_program_schedule.as_ref(),
            now,
        )?;
        let manager = resolver::resolve_sponsor(&self.db, invite)?.unwrap_or_default();

        Ok(EnrollmentRepo::new(self.db.clone()).create(&NewEnrollment {
            trainee_id: user.id.clone(),
            cohort_program_id: pairing.id,
            manager,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use devpulse_core::ids::RoleId;
    use devpulse_store::cohort_programs::{CohortProgramRepo, NewCohortProgram};
    use devpulse_store::cohorts::CohortRepo;
    use devpulse_store::invites::{InviteRepo, NewInvite};
    use devpulse_store::programs::ProgramRepo;
    use devpulse_store::roles::RoleRepo;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 8, 1, 12, 0, 0).unwrap()
    }

    fn new_user(role_id: &RoleId, username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@x.com"),
            password: "hashed".to_string(),
            first_name: None,
            last_name: None,
            role_id: role_id.clone(),
        }
    }

    fn seed_catalog(db: &Database) {
        let cohort = CohortRepo::new(db.clone()).create("Cohort 23", true).unwrap();
        let program = ProgramRepo::new(db.clone()).create("Bootcamp", 0, true).unwrap();
        CohortProgramRepo::new(db.clone())
            .create(&NewCohortProgram {
                cohort_id: cohort.id,
                program_id: program.id,
                start_date: None,
                auto_populate: true,
            })
            .unwrap();
    }

    fn invite_for(db: &Database, email: &str) -> Invite {
        InviteRepo::new(db.clone())
            .create(&NewInvite {
                email: email.to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn trainee_gets_user_and_enrollment() {
        let db = Database::in_memory().unwrap();
        let trainee = RoleRepo::new(db.clone()).create("Trainee", "trainee").unwrap();
        seed_catalog(&db);
        let invite = invite_for(&db, "jane@x.com");

        let writer = EnrollmentWriter::new(db.clone());
        let (user, enrollment) = writer
            .provision_and_enroll(&new_user(&trainee.id, "jane"), &trainee, &invite, now())
            .unwrap();

        let enrollment = enrollment.unwrap();
        assert_eq!(enrollment.trainee_id, user.id);
        assert_eq!(enrollment.name, "jane - Cohort 23 Bootcamp");
        assert!(enrollment.manager_id.is_none());
    }

    #[test]
    fn non_trainee_gets_user_only() {
        let db = Database::in_memory().unwrap();
        let manager = RoleRepo::new(db.clone()).create("Manager", "manager").unwrap();
        let invite = invite_for(&db, "boss@x.com");

        let writer = EnrollmentWriter::new(db.clone());
        let (user, enrollment) = writer
            .provision_and_enroll(&new_user(&manager.id, "boss"), &manager, &invite, now())
            .unwrap();

        assert!(enrollment.is_none());
        assert!(UserRepo::new(db).find(&user.id).unwrap().is_some());
    }

    #[test]
    fn manager_inviter_is_attached_to_enrollment() {
        let db = Database::in_memory().unwrap();
        let roles = RoleRepo::new(db.clone());
        let trainee = roles.create("Trainee", "trainee").unwrap();
        let manager = roles.create("Manager", "manager").unwrap();
        seed_catalog(&db);

        let boss = UserRepo::new(db.clone())
            .create(&new_user(&manager.id, "boss"))
            .unwrap();
        let invite = InviteRepo::new(db.clone())
            .create(&NewInvite {
                email: "jane@x.com".to_string(),
                inviter_id: Some(boss.id.clone()),
                ..Default::default()
            })
            .unwrap();

        let writer = EnrollmentWriter::new(db.clone());
        let (_, enrollment) = writer
            .provision_and_enroll(&new_user(&trainee.id, "jane"), &trainee, &invite, now())
            .unwrap();

        assert_eq!(enrollment.unwrap().manager_id, Some(boss.id));
    }

    #[test]
    fn failed_enrollment_rolls_back_the_user() {
        let db = Database::in_memory().unwrap();
        let trainee = RoleRepo::new(db.clone()).create("Trainee", "trainee").unwrap();
        // No catalog at all, so pairing selection fails after the user row
        // was written.
        let invite = invite_for(&db, "jane@x.com");

        let writer = EnrollmentWriter::new(db.clone());
        let result =
            writer.provision_and_enroll(&new_user(&trainee.id, "jane"), &trainee, &invite, now());

        assert_eq!(result.unwrap_err(), EnrollError::NoEntryProgram);
        assert!(UserRepo::new(db)
            .find_by_username("jane")
            .unwrap()
            .is_none());
    }

    #[test]
    fn pinned_schedule_is_used_for_the_enrollment() {
        let db = Database::in_memory().unwrap();
        let trainee = RoleRepo::new(db.clone()).create("Trainee", "trainee").unwrap();
        let cohort = CohortRepo::new(db.clone()).create("Cohort 24", true).unwrap();
        let program = ProgramRepo::new(db.clone()).create("Bootcamp", 0, true).unwrap();
        let pinned = CohortProgramRepo::new(db.clone())
            .create(&NewCohortProgram {
                cohort_id: cohort.id,
                program_id: program.id,
                start_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                auto_populate: true,
            })
            .unwrap();
        let invite = InviteRepo::new(db.clone())
            .create(&NewInvite {
                email: "jane@x.com".to_string(),
                cohort_program_schedule: Some(pinned.id.clone()),
                ..Default::default()
            })
            .unwrap();

        let writer = EnrollmentWriter::new(db.clone());
        let (_, enrollment) = writer
            .provision_and_enroll(&new_user(&trainee.id, "jane"), &trainee, &invite, now())
            .unwrap();

        assert_eq!(enrollment.unwrap().cohort_program_id, pinned.id);
    }
}
