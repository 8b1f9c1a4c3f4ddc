use super::auth::PasswordHasher;
use super::user_models::{PasswordCredentials, UserAccount};
use super::user_store::UserStore;
use crate::sqlite_column;
use crate::sqlite_persistence::{open_versioned_db, SqlType, Table, VersionedSchema};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// V 0
const USERS_TABLE_V_0: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!("email", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("password_hash", SqlType::Text, non_null = true),
        sqlite_column!("hasher", SqlType::Text, non_null = true),
        sqlite_column!(
            "profile_info",
            SqlType::Text,
            non_null = true,
            default_value = Some("'{}'")
        ),
        sqlite_column!("created_at", SqlType::Text, non_null = true),
    ],
    indices: &[],
};

const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USERS_TABLE_V_0],
    migration: None,
}];

const USER_COLUMNS: &str = "id, name, email, profile_info, created_at, password_hash, hasher";

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path, USER_VERSIONED_SCHEMAS)?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("User database connection mutex poisoned"))
    }
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.into())
}

fn user_from_row(row: &Row) -> rusqlite::Result<(UserAccount, PasswordCredentials)> {
    let raw_id: String = row.get(0)?;
    let id = Uuid::parse_str(&raw_id).map_err(|err| conversion_error(0, err))?;

    let raw_profile: String = row.get(3)?;
    let profile_info = match serde_json::from_str::<Value>(&raw_profile) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(err) => return Err(conversion_error(3, err)),
    };

    let raw_hasher: String = row.get(6)?;
    let hasher = PasswordHasher::from_str(&raw_hasher)
        .map_err(|err| conversion_error(6, err.to_string()))?;

    Ok((
        UserAccount {
            id,
            name: row.get(1)?,
            email: row.get(2)?,
            profile_info,
            created_at: row.get(4)?,
        },
        PasswordCredentials {
            hash: row.get(5)?,
            hasher,
        },
    ))
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user: &UserAccount, credentials: &PasswordCredentials) -> Result<bool> {
        let profile_info = serde_json::to_string(&user.profile_info)?;
        let conn = self.lock()?;
        let inserted = conn
            .execute(
                "INSERT INTO users (id, name, email, password_hash, hasher, profile_info, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) ON CONFLICT(email) DO NOTHING",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    credentials.hash,
                    credentials.hasher.to_string(),
                    profile_info,
                    user.created_at,
                ],
            )
            .with_context(|| format!("Failed to insert user {}", user.id))?;

        debug!("Inserted {} user row(s) for {}", inserted, user.email);
        Ok(inserted == 1)
    }

    fn get_user(&self, id: &Uuid) -> Result<Option<UserAccount>> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id.to_string()],
                user_from_row,
            )
            .optional()
            .with_context(|| format!("Failed to load user {}", id))?;
        Ok(found.map(|(user, _)| user))
    }

    fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(UserAccount, PasswordCredentials)>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
            params![email],
            user_from_row,
        )
        .optional()
        .context("Failed to look up user by email")
    }

    fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .context("User database did not answer")
    }
}
