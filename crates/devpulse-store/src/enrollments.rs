use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use devpulse_core::ids::{CohortProgramId, EnrollmentId, UserId};

use crate::database::Database;
use crate::error::StoreError;

/// The record linking a trainee to a cohort-program, optionally sponsored
/// by a manager. The manager side is a collection of size at most one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub name: String,
    pub trainee_id: UserId,
    pub cohort_program_id: CohortProgramId,
    pub manager_id: Option<UserId>,
    pub created_at: String,
}

#[derive(Clone, Debug)]
pub struct NewEnrollment {
    pub trainee_id: UserId,
    pub cohort_program_id: CohortProgramId,
    /// Manager linkage, 0 or 1 entries.
    pub manager: Vec<UserId>,
}

pub struct EnrollmentRepo {
    db: Database,
}

impl EnrollmentRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an enrollment. Trainee and pairing must exist; the name is
    /// derived as "{username} - {cohort_program.name}".
    #[instrument(skip(self, new), fields(trainee_id = %new.trainee_id))]
    pub fn create(&self, new: &NewEnrollment) -> Result<Enrollment, StoreError> {
        let trainee = crate::users::UserRepo::new(self.db.clone())
            .find(&new.trainee_id)?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", new.trainee_id)))?;
        let pairing = crate::cohort_programs::CohortProgramRepo::new(self.db.clone())
            .get(&new.cohort_program_id)?;
        let name = format!("{} - {}", trainee.username, pairing.name);

        let id = EnrollmentId::new();
        let manager_id = new.manager.first().cloned();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO enrollments (id, name, trainee_id, cohort_program_id, manager_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id.as_str(),
                    name,
                    new.trainee_id.as_str(),
                    new.cohort_program_id.as_str(),
                    manager_id.as_ref().map(|m| m.as_str().to_string()),
                    now,
                ],
            )?;

            Ok(Enrollment {
                id: id.clone(),
                name: name.clone(),
                trainee_id: new.trainee_id.clone(),
                cohort_program_id: new.cohort_program_id.clone(),
                manager_id: manager_id.clone(),
                created_at: now.clone(),
            })
        })
    }

    #[instrument(skip(self), fields(trainee_id = %id))]
    pub fn list_for_trainee(&self, id: &UserId) -> Result<Vec<Enrollment>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, trainee_id, cohort_program_id, manager_id, created_at
                 FROM enrollments WHERE trainee_id = ?1 ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([id.as_str()], row_to_enrollment)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn row_to_enrollment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: EnrollmentId::from_raw(row.get::<_, String>(0)?),
        name: row.get(1)?,
        trainee_id: UserId::from_raw(row.get::<_, String>(2)?),
        cohort_program_id: CohortProgramId::from_raw(row.get::<_, String>(3)?),
        manager_id: row.get::<_, Option<String>>(4)?.map(UserId::from_raw),
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort_programs::{CohortProgramRepo, NewCohortProgram};
    use crate::cohorts::CohortRepo;
    use crate::programs::ProgramRepo;
    use crate::roles::RoleRepo;
    use crate::users::{NewUser, UserRepo};

    fn setup() -> (Database, UserId, CohortProgramId) {
        let db = Database::in_memory().unwrap();
        let role = RoleRepo::new(db.clone()).create("Trainee", "trainee").unwrap();
        let user = UserRepo::new(db.clone())
            .create(&NewUser {
                username: "jane".to_string(),
                email: "jane@x.com".to_string(),
                password: "hashed".to_string(),
                first_name: None,
                last_name: None,
                role_id: role.id,
            })
            .unwrap();
        let cohort = CohortRepo::new(db.clone()).create("Cohort 23", true).unwrap();
        let program = ProgramRepo::new(db.clone()).create("Bootcamp", 0, true).unwrap();
        let pairing = CohortProgramRepo::new(db.clone())
            .create(&NewCohortProgram {
                cohort_id: cohort.id,
                program_id: program.id,
                start_date: None,
                auto_populate: true,
            })
            .unwrap();
        (db, user.id, pairing.id)
    }

    #[test]
    fn create_derives_name() {
        let (db, trainee_id, cp_id) = setup();
        let repo = EnrollmentRepo::new(db);

        let enrollment = repo
            .create(&NewEnrollment {
                trainee_id: trainee_id.clone(),
                cohort_program_id: cp_id,
                manager: vec![],
            })
            .unwrap();

        assert_eq!(enrollment.name, "jane - Cohort 23 Bootcamp");
        assert!(enrollment.manager_id.is_none());
    }

    #[test]
    fn manager_linkage_keeps_first() {
        let (db, trainee_id, cp_id) = setup();
        let role = RoleRepo::new(db.clone()).create("Manager", "manager").unwrap();
        let manager = UserRepo::new(db.clone())
            .create(&NewUser {
                username: "boss".to_string(),
                email: "boss@x.com".to_string(),
                password: "hashed".to_string(),
                first_name: None,
                last_name: None,
                role_id: role.id,
            })
            .unwrap();
        let repo = EnrollmentRepo::new(db);

        let enrollment = repo
            .create(&NewEnrollment {
                trainee_id,
                cohort_program_id: cp_id,
                manager: vec![manager.id.clone()],
            })
            .unwrap();

        assert_eq!(enrollment.manager_id, Some(manager.id));
    }

    #[test]
    fn create_with_missing_trainee_fails() {
        let (db, _, cp_id) = setup();
        let repo = EnrollmentRepo::new(db);

        let result = repo.create(&NewEnrollment {
            trainee_id: UserId::from_raw("user_nope"),
            cohort_program_id: cp_id,
            manager: vec![],
        });
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_for_trainee() {
        let (db, trainee_id, cp_id) = setup();
        let repo = EnrollmentRepo::new(db);

        assert!(repo.list_for_trainee(&trainee_id).unwrap().is_empty());

        repo.create(&NewEnrollment {
            trainee_id: trainee_id.clone(),
            cohort_program_id: cp_id,
            manager: vec![],
        })
        .unwrap();

        assert_eq!(repo.list_for_trainee(&trainee_id).unwrap().len(), 1);
    }
}
