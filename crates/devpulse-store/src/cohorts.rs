use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use devpulse_core::ids::CohortId;

use crate::database::Database;
use crate::error::StoreError;

/// A training group. `auto_populate` opts the cohort into combinatorial
/// cohort-program generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cohort {
    pub id: CohortId,
    pub name: String,
    pub auto_populate: bool,
    pub created_at: String,
}

pub struct CohortRepo {
    db: Database,
}

impl CohortRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub fn create(&self, name: &str, auto_populate: bool) -> Result<Cohort, StoreError> {
        let id = CohortId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cohorts (id, name, auto_populate, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.as_str(), name, auto_populate, now],
            )?;

            Ok(Cohort {
                id: id.clone(),
                name: name.to_string(),
                auto_populate,
                created_at: now.clone(),
            })
        })
    }

    #[instrument(skip(self), fields(cohort_id = %id))]
    pub fn get(&self, id: &CohortId) -> Result<Cohort, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, auto_populate, created_at FROM cohorts WHERE id = ?1",
                [id.as_str()],
                row_to_cohort,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("cohort {id}")))
        })
    }

    #[instrument(skip(self))]
    pub fn all(&self) -> Result<Vec<Cohort>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, auto_populate, created_at FROM cohorts ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], row_to_cohort)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn row_to_cohort(row: &rusqlite::Row<'_>) -> rusqlite::Result<Cohort> {
    Ok(Cohort {
        id: CohortId::from_raw(row.get::<_, String>(0)?),
        name: row.get(1)?,
        auto_populate: row.get(2)?,
        created_at: row.get(3)?,
    })
}
