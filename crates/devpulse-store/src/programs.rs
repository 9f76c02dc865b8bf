use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use devpulse_core::ids::ProgramId;

use crate::database::Database;
use crate::error::StoreError;

/// A curriculum track. `prerequisite` ranks tracks; rank 0 is the entry
/// program for new trainees.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub prerequisite: i64,
    pub auto_populate: bool,
    pub created_at: String,
}

/// Partial update; None fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct ProgramUpdate {
    pub name: Option<String>,
    pub prerequisite: Option<i64>,
    pub auto_populate: Option<bool>,
}

pub struct ProgramRepo {
    db: Database,
}

impl ProgramRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub fn create(
        &self,
        name: &str,
        prerequisite: i64,
        auto_populate: bool,
    ) -> Result<Program, StoreError> {
        let id = ProgramId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO programs (id, name, prerequisite, auto_populate, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id.as_str(), name, prerequisite, auto_populate, now],
            )?;

            Ok(Program {
                id: id.clone(),
                name: name.to_string(),
                prerequisite,
                auto_populate,
                created_at: now.clone(),
            })
        })
    }

    #[instrument(skip(self, update), fields(program_id = %id))]
    pub fn update(&self, id: &ProgramId, update: &ProgramUpdate) -> Result<Program, StoreError> {
        let current = self.get(id)?;
        let name = update.name.clone().unwrap_or(current.name);
        let prerequisite = update.prerequisite.unwrap_or(current.prerequisite);
        let auto_populate = update.auto_populate.unwrap_or(current.auto_populate);

        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE programs SET name = ?2, prerequisite = ?3, auto_populate = ?4 WHERE id = ?1",
                rusqlite::params![id.as_str(), name, prerequisite, auto_populate],
            )?;
            Ok(())
        })?;

        self.get(id)
    }

    #[instrument(skip(self), fields(program_id = %id))]
    pub fn get(&self, id: &ProgramId) -> Result<Program, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, prerequisite, auto_populate, created_at FROM programs WHERE id = ?1",
                [id.as_str()],
                row_to_program,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("program {id}")))
        })
    }

    /// Find the program at a given prerequisite rank (rank 0 is the entry
    /// program). Returns the first match in insertion order.
    #[instrument(skip(self))]
    pub fn find_by_prerequisite(&self, rank: i64) -> Result<Option<Program>, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, prerequisite, auto_populate, created_at
                     FROM programs WHERE prerequisite = ?1 ORDER BY created_at LIMIT 1",
                    [rank],
                    row_to_program,
                )
                .optional()?)
        })
    }

    /// Resolve a program id from its display name.
    #[instrument(skip(self))]
    pub fn id_by_name(&self, name: &str) -> Result<Option<ProgramId>, StoreError> {
        self.db.with_conn(|conn| {
            let id = conn
                .query_row("SELECT id FROM programs WHERE name = ?1", [name], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?;
            Ok(id.map(ProgramId::from_raw))
        })
    }

    #[instrument(skip(self))]
    pub fn all(&self) -> Result<Vec<Program>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, prerequisite, auto_populate, created_at FROM programs ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], row_to_program)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn row_to_program(row: &rusqlite::Row<'_>) -> rusqlite::Result<Program> {
    Ok(Program {
        id: ProgramId::from_raw(row.get::<_, String>(0)?),
        name: row.get(1)?,
        prerequisite: row.get(2)?,
        auto_populate: row.get(3)?,
        created_at: row.get(4)?,
    })
}
