use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema};

pub const JOBS_TABLE_V_0: Table = Table {
    name: "jobs",
    columns: &[
        sqlite_column!("id", SqlType::Text, is_primary_key = true),
        sqlite_column!("title", SqlType::Text, non_null = true),
        sqlite_column!("description", SqlType::Text, non_null = true),
        sqlite_column!("location", SqlType::Text, non_null = true),
        sqlite_column!("employment_type", SqlType::Text, non_null = true),
        sqlite_column!(
            "salary",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("posted_at", SqlType::Text, non_null = true),
        sqlite_column!("company", SqlType::Text, non_null = true),
        sqlite_column!("source_url", SqlType::Text, non_null = true),
        sqlite_column!("created_at", SqlType::Text, non_null = true),
        sqlite_column!("updated_at", SqlType::Text, non_null = true),
    ],
    indices: &[("idx_jobs_posted_at", "posted_at")],
};

pub const JOBS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[JOBS_TABLE_V_0],
    migration: None,
}];
