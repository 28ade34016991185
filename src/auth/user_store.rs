//! User Storage
//! Mission: Persist user accounts with SQLite

use crate::auth::models::UserRecord;
use crate::auth::roles::Role;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::info;

/// User storage with SQLite backend.
///
/// Connections are opened per call; SQLite serializes writers itself
/// and the access pattern here is light.
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                member_id TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                profile_image_url TEXT,
                last_login_date TEXT,
                last_login_date_display TEXT,
                date_of_join TEXT NOT NULL,
                role TEXT NOT NULL,
                active INTEGER NOT NULL,
                not_locked INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Insert a new user and return it with its assigned id.
    pub fn insert(&self, record: &UserRecord) -> Result<UserRecord> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO user_info (member_id, first_name, last_name, email, username,
                 password_hash, profile_image_url, last_login_date, last_login_date_display,
                 date_of_join, role, active, not_locked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                record.member_id,
                record.first_name,
                record.last_name,
                record.email,
                record.username,
                record.password_hash,
                record.profile_image_url,
                record.last_login_date.map(|d| d.to_rfc3339()),
                record.last_login_date_display.map(|d| d.to_rfc3339()),
                record.date_of_join.to_rfc3339(),
                record.role.as_str(),
                record.active,
                record.not_locked,
            ],
        )
        .context("Failed to insert user")?;

        let mut created = record.clone();
        created.id = conn.last_insert_rowid();
        info!(username = %created.username, role = created.role.as_str(), "Created user");
        Ok(created)
    }

    /// Persist changes to an existing user, keyed by id.
    pub fn update(&self, record: &UserRecord) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        let rows = conn
            .execute(
                "UPDATE user_info SET member_id = ?1, first_name = ?2, last_name = ?3,
                     email = ?4, username = ?5, password_hash = ?6, profile_image_url = ?7,
                     last_login_date = ?8, last_login_date_display = ?9, date_of_join = ?10,
                     role = ?11, active = ?12, not_locked = ?13
                 WHERE id = ?14",
                params![
                    record.member_id,
                    record.first_name,
                    record.last_name,
                    record.email,
                    record.username,
                    record.password_hash,
                    record.profile_image_url,
                    record.last_login_date.map(|d| d.to_rfc3339()),
                    record.last_login_date_display.map(|d| d.to_rfc3339()),
                    record.date_of_join.to_rfc3339(),
                    record.role.as_str(),
                    record.active,
                    record.not_locked,
                    record.id,
                ],
            )
            .context("Failed to update user")?;

        if rows == 0 {
            anyhow::bail!("User not found: id {}", record.id);
        }
        Ok(())
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.find_by_column("username", username)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.find_by_column("email", email)
    }

    fn find_by_column(&self, column: &str, value: &str) -> Result<Option<UserRecord>> {
        let conn = Connection::open(&self.db_path)?;
        let sql = format!(
            "SELECT id, member_id, first_name, last_name, email, username, password_hash,
                 profile_image_url, last_login_date, last_login_date_display, date_of_join,
                 role, active, not_locked
             FROM user_info WHERE {} = ?1",
            column
        );
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![value], row_to_record) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all users, oldest first.
    pub fn list(&self) -> Result<Vec<UserRecord>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, member_id, first_name, last_name, email, username, password_hash,
                 profile_image_url, last_login_date, last_login_date_display, date_of_join,
                 role, active, not_locked
             FROM user_info ORDER BY id",
        )?;

        let users = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Delete by username. Returns whether a row was removed.
    pub fn delete_by_username(&self, username: &str) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let rows = conn.execute(
            "DELETE FROM user_info WHERE username = ?1",
            params![username],
        )?;
        if rows > 0 {
            info!(username, "Deleted user");
        }
        Ok(rows > 0)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let role_str: String = row.get(11)?;
    let role = Role::parse(&role_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;

    Ok(UserRecord {
        id: row.get(0)?,
        member_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        username: row.get(5)?,
        password_hash: row.get(6)?,
        profile_image_url: row.get(7)?,
        last_login_date: parse_date_opt(row, 8)?,
        last_login_date_display: parse_date_opt(row, 9)?,
        date_of_join: parse_date(row, 10)?,
        role,
        active: row.get(12)?,
        not_locked: row.get(13)?,
    })
}

fn parse_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_date_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
    }
}
