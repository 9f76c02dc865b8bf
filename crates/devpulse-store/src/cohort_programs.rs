use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use devpulse_core::ids::{CohortId, CohortProgramId, ProgramId};

use crate::database::Database;
use crate::error::StoreError;

/// The pairing of a cohort with a program. The display name is derived at
/// creation time from the two sides; `start_date` is absent on pairings
/// produced by auto-population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CohortProgram {
    pub id: CohortProgramId,
    pub name: String,
    pub cohort_id: CohortId,
    pub program_id: ProgramId,
    pub start_date: Option<String>,
    pub auto_populate: bool,
    pub created_at: String,
}

impl CohortProgram {
    /// The date this pairing becomes selectable. A missing or unparseable
    /// start date counts as `now`, so undated pairings are immediately
    /// eligible.
    pub fn effective_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or(now)
    }
}

#[derive(Clone, Debug)]
pub struct NewCohortProgram {
    pub cohort_id: CohortId,
    pub program_id: ProgramId,
    pub start_date: Option<DateTime<Utc>>,
    pub auto_populate: bool,
}

pub struct CohortProgramRepo {
    db: Database,
}

impl CohortProgramRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a pairing. Both sides must exist; the name is derived as
    /// "{cohort.name} {program.name}".
    #[instrument(skip(self, new), fields(cohort_id = %new.cohort_id, program_id = %new.program_id))]
    pub fn create(&self, new: &NewCohortProgram) -> Result<CohortProgram, StoreError> {
        let cohort = crate::cohorts::CohortRepo::new(self.db.clone()).get(&new.cohort_id)?;
        let program = crate::programs::ProgramRepo::new(self.db.clone()).get(&new.program_id)?;
        let name = format!("{} {}", cohort.name, program.name);

        let id = CohortProgramId::new();
        let start_date = new.start_date.map(|d| d.to_rfc3339());
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cohort_programs (id, name, cohort_id, program_id, start_date, auto_populate, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    id.as_str(),
                    name,
                    new.cohort_id.as_str(),
                    new.program_id.as_str(),
                    start_date,
                    new.auto_populate,
                    now,
                ],
            )?;

            Ok(CohortProgram {
                id: id.clone(),
                name: name.clone(),
                cohort_id: new.cohort_id.clone(),
                program_id: new.program_id.clone(),
                start_date: start_date.clone(),
                auto_populate: new.auto_populate,
                created_at: now.clone(),
            })
        })
    }

    #[instrument(skip(self), fields(cohort_program_id = %id))]
    pub fn get(&self, id: &CohortProgramId) -> Result<CohortProgram, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, cohort_id, program_id, start_date, auto_populate, created_at
                 FROM cohort_programs WHERE id = ?1",
                [id.as_str()],
                row_to_pairing,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("cohort program {id}")))
        })
    }

    #[instrument(skip(self))]
    pub fn all(&self) -> Result<Vec<CohortProgram>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, cohort_id, program_id, start_date, auto_populate, created_at
                 FROM cohort_programs ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], row_to_pairing)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// How many pairings the cohort already participates in.
    #[instrument(skip(self), fields(cohort_id = %id))]
    pub fn count_for_cohort(&self, id: &CohortId) -> Result<i64, StoreError> {
        self.count("SELECT COUNT(*) FROM cohort_programs WHERE cohort_id = ?1", id.as_str())
    }

    /// How many pairings the program already participates in.
    #[instrument(skip(self), fields(program_id = %id))]
    pub fn count_for_program(&self, id: &ProgramId) -> Result<i64, StoreError> {
        self.count("SELECT COUNT(*) FROM cohort_programs WHERE program_id = ?1", id.as_str())
    }

    fn count(&self, sql: &str, param: &str) -> Result<i64, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(sql, [param], |row| row.get(0))
                .map_err(|e| StoreError::Database(e.to_string()))
        })
    }
}

fn row_to_pairing(row: &rusqlite::Row<'_>) -> rusqlite::Result<CohortProgram> {
    Ok(CohortProgram {
        id: CohortProgramId::from_raw(row.get::<_, String>(0)?),
        name: row.get(1)?,
        cohort_id: CohortId::from_raw(row.get::<_, String>(2)?),
        program_id: ProgramId::from_raw(row.get::<_, String>(3)?),
        start_date: row.get(4)?,
        auto_populate: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohorts::CohortRepo;
    use crate::programs::ProgramRepo;
    use chrono::TimeZone;

    fn setup() -> (Database, CohortId, ProgramId) {
        let db = Database::in_memory().unwrap();
        let cohort = CohortRepo::new(db.clone()).create("Cohort 23", true).unwrap();
        let program = ProgramRepo::new(db.clone()).create("Bootcamp", 0, true).unwrap();
        (db, cohort.id, program.id)
    }

    fn pairing(cohort_id: &CohortId, program_id: &ProgramId) -> NewCohortProgram {
        NewCohortProgram {
            cohort_id: cohort_id.clone(),
            program_id: program_id.clone(),
            start_date: None,
            auto_populate: true,
        }
    }

    #[test]
    fn create_derives_name() {
        let (db, cohort_id, program_id) = setup();
        let repo = CohortProgramRepo::new(db);

        let cp = repo.create(&pairing(&cohort_id, &program_id)).unwrap();
        assert_eq!(cp.name, "Cohort 23 Bootcamp");
        assert!(cp.id.as_str().starts_with("cp_"));
    }

    #[test]
    fn create_with_missing_side_fails() {
        let (db, cohort_id, _) = setup();
        let repo = CohortProgramRepo::new(db);

        let result = repo.create(&pairing(&cohort_id, &ProgramId::from_raw("prog_nope")));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn start_date_roundtrip() {
        let (db, cohort_id, program_id) = setup();
        let repo = CohortProgramRepo::new(db);

        let start = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let cp = repo
            .create(&NewCohortProgram {
                start_date: Some(start),
                ..pairing(&cohort_id, &program_id)
            })
            .unwrap();

        let fetched = repo.get(&cp.id).unwrap();
        let now = Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0).unwrap();
        assert_eq!(fetched.effective_start(now), start);
    }

    #[test]
    fn missing_start_date_counts_as_now() {
        let (db, cohort_id, program_id) = setup();
        let repo = CohortProgramRepo::new(db);

        let cp = repo.create(&pairing(&cohort_id, &program_id)).unwrap();
        let now = Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0).unwrap();
        assert_eq!(cp.effective_start(now), now);
    }

    #[test]
    fn counts_per_side() {
        let (db, cohort_id, program_id) = setup();
        let second = ProgramRepo::new(db.clone()).create("Apprenticeship", 1, true).unwrap();
        let repo = CohortProgramRepo::new(db);

        assert_eq!(repo.count_for_cohort(&cohort_id).unwrap(), 0);

        repo.create(&pairing(&cohort_id, &program_id)).unwrap();
        repo.create(&pairing(&cohort_id, &second.id)).unwrap();

        assert_eq!(repo.count_for_cohort(&cohort_id).unwrap(), 2);
        assert_eq!(repo.count_for_program(&program_id).unwrap(), 1);
    }
}
