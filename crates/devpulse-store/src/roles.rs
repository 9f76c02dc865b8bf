use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use devpulse_core::ids::RoleId;

use crate::database::Database;
use crate::error::StoreError;

/// A platform role. `name` drives enrollment decisions ("Trainee",
/// "Manager", "Super Admin"); `role_type` is the symbolic key used for
/// default-role lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub role_type: String,
    pub created_at: String,
}

pub struct RoleRepo {
    db: Database,
}

impl RoleRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub fn create(&self, name: &str, role_type: &str) -> Result<Role, StoreError> {
        let id = RoleId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO roles (id, name, type, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.as_str(), name, role_type, now],
            )?;

            Ok(Role {
                id: id.clone(),
                name: name.to_string(),
                role_type: role_type.to_string(),
                created_at: now.clone(),
            })
        })
    }

    /// Find a role by id. Returns None when no such role exists.
    #[instrument(skip(self), fields(role_id = %id))]
    pub fn find(&self, id: &RoleId) -> Result<Option<Role>, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, type, created_at FROM roles WHERE id = ?1",
                    [id.as_str()],
                    row_to_role,
                )
                .optional()?)
        })
    }

    /// Find a role by its symbolic type (e.g. the configured default).
    #[instrument(skip(self))]
    pub fn find_by_type(&self, role_type: &str) -> Result<Option<Role>, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, type, created_at FROM roles WHERE type = ?1",
                    [role_type],
                    row_to_role,
                )
                .optional()?)
        })
    }
}

fn row_to_role(row: &rusqlite::Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: RoleId::from_raw(row.get::<_, String>(0)?),
        name: row.get(1)?,
        role_type: row.get(2)?,
        created_at: row.get(3)?,
    })
}
