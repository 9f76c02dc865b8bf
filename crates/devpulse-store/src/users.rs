use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use devpulse_core::ids::{RoleId, UserId};

use crate::database::Database;
use crate::error::StoreError;

/// A provisioned user as the enrollment core sees it. The stored credential
/// is write-only: it never appears on this row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub provider: String,
    pub role_id: RoleId,
    pub created_at: String,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role_id: RoleId,
}

pub struct UserRepo {
    db: Database,
}

impl UserRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, new), fields(username = %new.username))]
    pub fn create(&self, new: &NewUser) -> Result<User, StoreError> {
        let id = UserId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, first_name, last_name, password, provider, role_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'local', ?7, ?8)",
                rusqlite::params![
                    id.as_str(),
                    new.username,
                    new.email,
                    new.first_name,
                    new.last_name,
                    new.password,
                    new.role_id.as_str(),
                    now,
                ],
            )?;

            Ok(User {
                id: id.clone(),
                username: new.username.clone(),
                email: new.email.clone(),
                first_name: new.first_name.clone(),
                last_name: new.last_name.clone(),
                provider: "local".to_string(),
                role_id: new.role_id.clone(),
                created_at: now.clone(),
            })
        })
    }

    #[instrument(skip(self), fields(user_id = %id))]
    pub fn find(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.query_one("SELECT id, username, email, first_name, last_name, provider, role_id, created_at FROM users WHERE id = ?1", id.as_str())
    }

    /// Find a user by email. Callers pass the already-lowercased address.
    #[instrument(skip(self))]
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.query_one("SELECT id, username, email, first_name, last_name, provider, role_id, created_at FROM users WHERE email = ?1", email)
    }

    #[instrument(skip(self))]
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.query_one("SELECT id, username, email, first_name, last_name, provider, role_id, created_at FROM users WHERE username = ?1", username)
    }

    /// Delete a user. Used as compensation when enrollment fails after the
    /// user row was already written.
    #[instrument(skip(self), fields(user_id = %id))]
    pub fn delete(&self, id: &UserId) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let rows = conn.execute("DELETE FROM users WHERE id = ?1", [id.as_str()])?;
            if rows == 0 {
                return Err(StoreError::NotFound(format!("user {id}")));
            }
            Ok(())
        })
    }

    fn query_one(&self, sql: &str, param: &str) -> Result<Option<User>, StoreError> {
        self.db
            .with_conn(|conn| Ok(conn.query_row(sql, [param], row_to_user).optional()?))
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::from_raw(row.get::<_, String>(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        provider: row.get(5)?,
        role_id: RoleId::from_raw(row.get::<_, String>(6)?),
        created_at: row.get(7)?,
    })
}
