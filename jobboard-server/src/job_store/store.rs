use super::models::{JobPosting, JobRecord, JobUpsert};
use super::schema::{JOBS_TABLE_V_0, JOBS_VERSIONED_SCHEMAS};
use super::trait_def::JobStore;
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, title, description, location, employment_type, salary, \
     posted_at, company, source_url, created_at, updated_at";

const UPSERT_JOB_SQL: &str = "INSERT INTO jobs (id, title, description, location, \
     employment_type, salary, posted_at, company, source_url, created_at, updated_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
     ON CONFLICT(id) DO UPDATE SET \
     title = excluded.title, \
     description = excluded.description, \
     location = excluded.location, \
     employment_type = excluded.employment_type, \
     salary = excluded.salary, \
     posted_at = excluded.posted_at, \
     company = excluded.company, \
     source_url = excluded.source_url, \
     created_at = excluded.created_at, \
     updated_at = excluded.updated_at";

#[derive(Clone)]
pub struct SqliteJobStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteJobStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path, JOBS_VERSIONED_SCHEMAS)?;
        Ok(SqliteJobStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Jobs database connection mutex poisoned"))
    }
}

fn job_from_row(row: &Row) -> rusqlite::Result<JobRecord> {
    let raw_id: String = row.get(0)?;
    let id = Uuid::parse_str(&raw_id)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err)))?;
    Ok(JobRecord {
        id,
        posting: JobPosting {
            title: row.get(1)?,
            description: row.get(2)?,
            location: row.get(3)?,
            employment_type: row.get(4)?,
            salary: row.get(5)?,
            posted_at: row.get(6)?,
            company: row.get(7)?,
            source_url: row.get(8)?,
        },
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl JobStore for SqliteJobStore {
    fn upsert_jobs(&self, jobs: &[JobUpsert], now: NaiveDateTime) -> Result<usize> {
        let mut conn = self.lock()?;
        let mut written = HashSet::with_capacity(jobs.len());
        // Dropping the transaction without commit rolls it back.
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_JOB_SQL)?;
            for job in jobs {
                let posting = &job.posting;
                stmt.execute(params![
                    job.id.to_string(),
                    posting.title,
                    posting.description,
                    posting.location,
                    posting.employment_type,
                    posting.salary,
                    posting.posted_at,
                    posting.company,
                    posting.source_url,
                    now,
                    now,
                ])
                .with_context(|| format!("Failed to upsert job {}", job.id))?;
                written.insert(job.id);
            }
        }
        tx.commit().context("Failed to commit jobs batch")?;
        debug!("Upserted {} jobs from {} records", written.len(), jobs.len());
        Ok(written.len())
    }

    fn list_jobs(&self, offset: usize, limit: usize) -> Result<Vec<JobRecord>> {
        // SQLite reads a negative OFFSET as 0, anything past i64::MAX is past the end.
        let Ok(offset) = i64::try_from(offset) else {
            return Ok(Vec::new());
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY posted_at DESC, id ASC LIMIT ?1 OFFSET ?2",
            JOB_COLUMNS, JOBS_TABLE_V_0.name
        ))?;
        let jobs = stmt
            .query_map(params![limit, offset], job_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }

    fn count_jobs(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", JOBS_TABLE_V_0.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn get_job(&self, id: &Uuid) -> Result<Option<JobRecord>> {
        let conn = self.lock()?;
        let job = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    JOB_COLUMNS, JOBS_TABLE_V_0.name
                ),
                params![id.to_string()],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
