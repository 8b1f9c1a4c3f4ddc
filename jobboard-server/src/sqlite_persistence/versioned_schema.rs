//! Declarative SQLite schemas with a version number stored in `PRAGMA user_version`.
//!
//! Each store declares the full list of its schema versions. A fresh database is
//! created at the latest version, an existing one is validated against the schema
//! matching its stored version and then migrated forward.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use tracing::info;

/// Offset added to the schema version before writing it to `user_version`,
/// so databases not created by this server are rejected.
pub const BASE_DB_VERSION: usize = 77000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = $crate::sqlite_persistence::Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }

    fn parse(declared: &str) -> Option<SqlType> {
        match declared {
            "TEXT" => Some(SqlType::Text),
            "INTEGER" => Some(SqlType::Integer),
            _ => None,
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<&'static str>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// (index name, indexed column)
    pub indices: &'static [(&'static str, &'static str)],
}

struct ActualColumn {
    name: String,
    sql_type: Option<SqlType>,
    non_null: bool,
    default_value: Option<String>,
    is_primary_key: bool,
}

impl Table {
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut def = format!("{} {}", column.name, column.sql_type.as_sql());
                if column.is_primary_key {
                    def.push_str(" PRIMARY KEY");
                }
                if column.non_null {
                    def.push_str(" NOT NULL");
                }
                if column.is_unique {
                    def.push_str(" UNIQUE");
                }
                if let Some(default_value) = column.default_value {
                    def.push_str(&format!(" DEFAULT {}", default_value));
                }
                def
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({});", self.name, columns)
    }

    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute(&self.create_sql(), params![])
            .with_context(|| format!("Failed to create table {}", self.name))?;
        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual = stmt
            .query_map(params![], |row| {
                Ok(ActualColumn {
                    name: row.get(1)?,
                    sql_type: SqlType::parse(&row.get::<_, String>(2)?),
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if actual.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}",
                self.name,
                actual.len(),
                self.columns.len()
            );
        }

        for (actual, expected) in actual.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != Some(expected.sql_type) {
                bail!(
                    "Table {} column {} type mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    actual.sql_type
                );
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {} non-null mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.non_null,
                    actual.non_null
                );
            }
            // SQLite may report defaults wrapped in parentheses
            let actual_default = actual.default_value.as_deref().map(strip_parentheses);
            let expected_default = expected.default_value.map(strip_parentheses);
            if actual_default != expected_default {
                bail!(
                    "Table {} column {} default value mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.default_value,
                    actual.default_value
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {} primary key mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.is_primary_key,
                    actual.is_primary_key
                );
            }
        }

        for column in self.columns.iter().filter(|c| c.is_unique && !c.is_primary_key) {
            if !has_unique_index(conn, self.name, column.name)? {
                bail!(
                    "Table {} column {} is missing its unique constraint",
                    self.name,
                    column.name
                );
            }
        }

        for (index_name, _) in self.indices {
            let index_exists = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !index_exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }
}

fn has_unique_index(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list({});", table))?;
    let unique_indices = stmt
        .query_map(params![], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)? == 1))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (index_name, is_unique) in unique_indices {
        if !is_unique {
            continue;
        }
        let mut info = conn.prepare(&format!("PRAGMA index_info('{}');", index_name))?;
        let indexed = info
            .query_map(params![], |row| row.get::<_, Option<String>>(2))?
            .collect::<Result<Vec<_>, _>>()?;
        if indexed.len() == 1 && indexed[0].as_deref() == Some(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn strip_parentheses(s: &str) -> &str {
    s.strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(s)
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        set_user_version(conn, self.version)
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }
}

fn set_user_version(conn: &Connection, version: usize) -> Result<()> {
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + version),
        [],
    )?;
    Ok(())
}

/// Opens (or creates) the database at `db_path` and brings it to the latest
/// version in `schemas`.
pub fn open_versioned_db<P: AsRef<Path>>(db_path: P, schemas: &[VersionedSchema]) -> Result<Connection> {
    let db_path = db_path.as_ref();
    let latest = schemas.last().context("No schema versions declared")?;

    let conn = if db_path.exists() {
        Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database {:?}", db_path))?
    } else {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to create database {:?}", db_path))?;
        latest.create(&conn)?;
        conn
    };

    let stored_version = conn
        .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
        .context("Failed to read database version")?
        - BASE_DB_VERSION as i64;

    if stored_version < 0 {
        bail!(
            "Database {:?} was not created by this server (user_version below {})",
            db_path,
            BASE_DB_VERSION
        );
    }
    let version = stored_version as usize;
    let schema = match schemas.get(version) {
        Some(schema) => schema,
        None => bail!("Database version {} is too new", version),
    };
    schema.validate(&conn)?;

    let mut current = version;
    for schema in schemas.iter().skip(version + 1) {
        if let Some(migration) = schema.migration {
            info!(
                "Migrating {:?} from version {} to {}",
                db_path, current, schema.version
            );
            migration(&conn)?;
        }
        current = schema.version;
    }
    if current != version {
        set_user_version(&conn, current)?;
    }

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NOTES_V_0: Table = Table {
        name: "notes",
        columns: &[
            sqlite_column!("id", SqlType::Text, is_primary_key = true),
            sqlite_column!("body", SqlType::Text, non_null = true),
        ],
        indices: &[("idx_notes_body", "body")],
    };

    const NOTES_V_1: Table = Table {
        name: "notes",
        columns: &[
            sqlite_column!("id", SqlType::Text, is_primary_key = true),
            sqlite_column!("body", SqlType::Text, non_null = true),
            sqlite_column!(
                "pinned",
                SqlType::Integer,
                non_null = true,
                default_value = Some("0")
            ),
        ],
        indices: &[("idx_notes_body", "body")],
    };

    const SCHEMAS_V_0: &[VersionedSchema] = &[VersionedSchema {
        version: 0,
        tables: &[NOTES_V_0],
        migration: None,
    }];

    const SCHEMAS_V_1: &[VersionedSchema] = &[
        VersionedSchema {
            version: 0,
            tables: &[NOTES_V_0],
            migration: None,
        },
        VersionedSchema {
            version: 1,
            tables: &[NOTES_V_1],
            migration: Some(|conn: &Connection| {
                conn.execute(
                    "ALTER TABLE notes ADD COLUMN pinned INTEGER NOT NULL DEFAULT 0",
                    [],
                )?;
                Ok(())
            }),
        },
    ];

    fn user_version(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn creates_fresh_database_at_latest_version() {
        let dir = TempDir::new().unwrap();
        let conn = open_versioned_db(dir.path().join("a.db"), SCHEMAS_V_1).unwrap();

        assert_eq!(user_version(&conn), (BASE_DB_VERSION + 1) as i64);
        SCHEMAS_V_1[1].validate(&conn).unwrap();
    }

    #[test]
    fn migrates_existing_database_forward() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.db");
        {
            let conn = open_versioned_db(&path, SCHEMAS_V_0).unwrap();
            conn.execute("INSERT INTO notes (id, body) VALUES ('n1', 'hello')", [])
                .unwrap();
        }

        let conn = open_versioned_db(&path, SCHEMAS_V_1).unwrap();

        assert_eq!(user_version(&conn), (BASE_DB_VERSION + 1) as i64);
        let pinned: i64 = conn
            .query_row("SELECT pinned FROM notes WHERE id = 'n1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(pinned, 0);
    }

    #[test]
    fn rejects_foreign_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foreign.db");
        Connection::open(&path)
            .unwrap()
            .execute("CREATE TABLE notes (id TEXT PRIMARY KEY)", [])
            .unwrap();

        let err = open_versioned_db(&path, SCHEMAS_V_1).unwrap_err();
        assert!(err.to_string().contains("not created by this server"));
    }

    #[test]
    fn rejects_database_newer_than_known_schemas() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.db");
        drop(open_versioned_db(&path, SCHEMAS_V_1).unwrap());

        let err = open_versioned_db(&path, SCHEMAS_V_0).unwrap_err();
        assert!(err.to_string().contains("too new"));
    }

    #[test]
    fn validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE notes (id TEXT PRIMARY KEY, body TEXT NOT NULL)",
            [],
        )
        .unwrap();

        let err = SCHEMAS_V_0[0].validate(&conn).unwrap_err();
        assert!(err.to_string().contains("missing index"));
    }

    #[test]
    fn validate_detects_nullability_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE notes (id TEXT PRIMARY KEY, body TEXT)", [])
            .unwrap();
        conn.execute("CREATE INDEX idx_notes_body ON notes(body)", [])
            .unwrap();

        let err = SCHEMAS_V_0[0].validate(&conn).unwrap_err();
        assert!(err.to_string().contains("non-null mismatch"));
    }

    #[test]
    fn validate_detects_missing_unique_constraint() {
        const ACCOUNTS: Table = Table {
            name: "accounts",
            columns: &[
                sqlite_column!("id", SqlType::Text, is_primary_key = true),
                sqlite_column!("email", SqlType::Text, non_null = true, is_unique = true),
            ],
            indices: &[],
        };
        const SCHEMA: VersionedSchema = VersionedSchema {
            version: 0,
            tables: &[ACCOUNTS],
            migration: None,
        };

        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE accounts (id TEXT PRIMARY KEY, email TEXT NOT NULL)",
            [],
        )
        .unwrap();
        let err = SCHEMA.validate(&conn).unwrap_err();
        assert!(err.to_string().contains("unique constraint"));

        let conn = Connection::open_in_memory().unwrap();
        ACCOUNTS.create(&conn).unwrap();
        SCHEMA.validate(&conn).unwrap();
    }
}
