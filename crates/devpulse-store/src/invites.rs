use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use devpulse_core::ids::{CohortProgramId, InviteId, RoleId, UserId};

use crate::database::Database;
use crate::error::StoreError;

/// A pending authorization for one email address to register, optionally
/// pinned to a role, an inviter, and a cohort-program schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Invite {
    pub id: InviteId,
    pub email: String,
    pub role_id: Option<RoleId>,
    pub inviter_id: Option<UserId>,
    pub cohort_program_schedule: Option<CohortProgramId>,
    pub created_at: String,
}

#[derive(Clone, Debug, Default)]
pub struct NewInvite {
    pub email: String,
    pub role_id: Option<RoleId>,
    pub inviter_id: Option<UserId>,
    pub cohort_program_schedule: Option<CohortProgramId>,
}

pub struct InviteRepo {
    db: Database,
}

impl InviteRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an invite. The email is normalized to lowercase here, at
    /// creation time; the row is never mutated afterwards.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub fn create(&self, new: &NewInvite) -> Result<Invite, StoreError> {
        let id = InviteId::new();
        let email = new.email.to_lowercase();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO invites (id, email, role_id, inviter_id, cohort_program_schedule, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id.as_str(),
                    email,
                    new.role_id.as_ref().map(|r| r.as_str().to_string()),
                    new.inviter_id.as_ref().map(|u| u.as_str().to_string()),
                    new.cohort_program_schedule
                        .as_ref()
                        .map(|c| c.as_str().to_string()),
                    now,
                ],
            )?;

            Ok(Invite {
                id: id.clone(),
                email: email.clone(),
                role_id: new.role_id.clone(),
                inviter_id: new.inviter_id.clone(),
                cohort_program_schedule: new.cohort_program_schedule.clone(),
                created_at: now.clone(),
            })
        })
    }

    /// Find an invite by email, matching case-insensitively.
    #[instrument(skip(self))]
    pub fn find_by_email(&self, email: &str) -> Result<Option<Invite>, StoreError> {
        let email = email.to_lowercase();
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, email, role_id, inviter_id, cohort_program_schedule, created_at
                     FROM invites WHERE email = ?1",
                    [email],
                    row_to_invite,
                )
                .optional()?)
        })
    }
}

fn row_to_invite(row: &rusqlite::Row<'_>) -> rusqlite::Result<Invite> {
    Ok(Invite {
        id: InviteId::from_raw(row.get::<_, String>(0)?),
        email: row.get(1)?,
        role_id: row.get::<_, Option<String>>(2)?.map(RoleId::from_raw),
        inviter_id: row.get::<_, Option<String>>(3)?.map(UserId::from_raw),
        cohort_program_schedule: row
            .get::<_, Option<String>>(4)?
            .map(CohortProgramId::from_raw),
        created_at: row.get(5)?,
    })
}
