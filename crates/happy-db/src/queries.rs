use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode};

use crate::models::{MomentRow, UserRow};
use crate::{Database, Result, StoreError};

impl Database {
    // -- Users --

    /// Insert a credential row and return the new user id.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            );

            match result {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(e) if is_constraint_violation(&e) => Err(StoreError::DuplicateUsername),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Exact, case-sensitive lookup.
    pub fn find_user(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Moments --

    pub fn insert_moment(
        &self,
        user_id: i64,
        note: &str,
        image: Option<&[u8]>,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        let created_at = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO happy_moments (user_id, note, image, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id, note, image, created_at],
            );

            match result {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(e) if is_constraint_violation(&e) => Err(StoreError::UnknownUser(user_id)),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// All moments owned by `user_id`, oldest first.
    pub fn list_moments_by_user(&self, user_id: i64) -> Result<Vec<MomentRow>> {
        self.with_conn(|conn| query_moments_by_user(conn, user_id))
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    // Hashes written by other tools may be stored as BLOBs.
    let mut stmt = conn.prepare(
        "SELECT id, username, CAST(password AS TEXT) FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_moments_by_user(conn: &Connection, user_id: i64) -> Result<Vec<MomentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, note, image, created_at
         FROM happy_moments
         WHERE user_id = ?1
         ORDER BY id",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(MomentRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                note: row.get(2)?,
                image: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
