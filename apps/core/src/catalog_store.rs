use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::DateTime;
use once_cell::sync::OnceCell;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use crate::config::Config;
use crate::model::{Difficulty, ProblemRecord, SolveStatus, SyncMetadata};

const METADATA_KEY: &str = "sync";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS problem (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        slug TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        is_paid_only INTEGER NOT NULL,
        ac_rate REAL NOT NULL,
        status TEXT
    );
    CREATE UNIQUE INDEX IF NOT EXISTS problem_by_slug ON problem(slug);
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        last_fetched_at INTEGER NOT NULL,
        total_count INTEGER NOT NULL,
        schema_version TEXT NOT NULL
    );
";

const PROBLEM_COLUMNS: &str = "id, title, slug, difficulty, is_paid_only, ac_rate, status";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("storage query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

/// All access goes through one mutex, so readers never see a half-applied
/// `replace_all`.
pub struct CatalogStore {
    location: StoreLocation,
    conn: OnceCell<Mutex<Connection>>,
}

impl CatalogStore {
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            conn: OnceCell::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(StoreLocation::Memory)
    }

    pub fn open_file(path: &Path) -> Self {
        Self::new(StoreLocation::File(path.to_path_buf()))
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::open_file(&cfg.catalog_db_path)
    }

    pub fn connect(&self) -> Result<(), StoreError> {
        self.conn.get_or_try_init(|| open_connection(&self.location))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| open_connection(&self.location))?;
        conn.lock()
            .map_err(|_| StoreError::StorageUnavailable("connection lock poisoned".to_string()))
    }

    pub fn get_all(&self) -> Result<Vec<ProblemRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROBLEM_COLUMNS} FROM problem ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([], problem_from_row)?;
        let problems = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(problems)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<ProblemRecord>, StoreError> {
        let conn = self.lock()?;
        let problem = conn
            .query_row(
                &format!("SELECT {PROBLEM_COLUMNS} FROM problem WHERE id = ?1"),
                params![id],
                problem_from_row,
            )
            .optional()?;
        Ok(problem)
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<Option<ProblemRecord>, StoreError> {
        let conn = self.lock()?;
        let problem = conn
            .query_row(
                &format!("SELECT {PROBLEM_COLUMNS} FROM problem WHERE slug = ?1"),
                params![slug],
                problem_from_row,
            )
            .optional()?;
        Ok(problem)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM problem", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn replace_all(&self, records: &[ProblemRecord]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        replace_problems(&tx, records)?;
        tx.commit()?;
        Ok(())
    }

    /// Replaces the records and writes the metadata describing them in one
    /// transaction.
    pub fn replace_all_with_metadata(
        &self,
        records: &[ProblemRecord],
        meta: &SyncMetadata,
    ) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        replace_problems(&tx, records)?;
        write_metadata(&tx, meta)?;
        tx.commit()?;
        Ok(())
    }

    pub fn put_metadata(&self, meta: &SyncMetadata) -> Result<(), StoreError> {
        let conn = self.lock()?;
        write_metadata(&conn, meta)?;
        Ok(())
    }

    pub fn get_metadata(&self) -> Result<Option<SyncMetadata>, StoreError> {
        let conn = self.lock()?;
        let meta = conn
            .query_row(
                "SELECT last_fetched_at, total_count, schema_version FROM metadata WHERE key = ?1",
                params![METADATA_KEY],
                |row| {
                    let millis: i64 = row.get(0)?;
                    let last_fetched_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                        rusqlite::Error::IntegralValueOutOfRange(0, millis)
                    })?;
                    let total_count: i64 = row.get(1)?;
                    Ok(SyncMetadata {
                        last_fetched_at,
                        total_count: usize::try_from(total_count).unwrap_or(0),
                        schema_version: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(meta)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM problem", [])?;
        tx.execute("DELETE FROM metadata", [])?;
        tx.commit()?;
        Ok(())
    }
}

fn open_connection(location: &StoreLocation) -> Result<Mutex<Connection>, StoreError> {
    let conn = match location {
        StoreLocation::Memory => Connection::open_in_memory(),
        StoreLocation::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::StorageUnavailable(format!(
                        "failed to create catalog dir {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            Connection::open(path)
        }
    }
    .map_err(|e| StoreError::StorageUnavailable(format!("failed to open catalog: {e}")))?;

    if matches!(location, StoreLocation::File(_)) {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
            .map_err(|e| StoreError::StorageUnavailable(format!("failed to enable WAL: {e}")))?;
    }
    conn.execute_batch(SCHEMA)
        .map_err(|e| StoreError::StorageUnavailable(format!("failed to apply schema: {e}")))?;

    log::debug!("catalog store connected: {location:?}");
    Ok(Mutex::new(conn))
}

fn replace_problems(tx: &Transaction<'_>, records: &[ProblemRecord]) -> Result<(), StoreError> {
    tx.execute("DELETE FROM problem", [])?;
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO problem ({PROBLEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
    ))?;
    for record in records {
        stmt.execute(params![
            record.id,
            record.title,
            record.slug,
            record.difficulty,
            record.is_paid_only,
            record.ac_rate,
            record.status,
        ])?;
    }
    Ok(())
}

fn write_metadata(conn: &Connection, meta: &SyncMetadata) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO metadata (key, last_fetched_at, total_count, schema_version)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(key) DO UPDATE SET last_fetched_at=excluded.last_fetched_at,
             total_count=excluded.total_count, schema_version=excluded.schema_version",
        params![
            METADATA_KEY,
            meta.last_fetched_at.timestamp_millis(),
            i64::try_from(meta.total_count).unwrap_or(i64::MAX),
            meta.schema_version,
        ],
    )?;
    Ok(())
}

fn problem_from_row(row: &Row<'_>) -> rusqlite::Result<ProblemRecord> {
    Ok(ProblemRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        difficulty: row.get(3)?,
        is_paid_only: row.get(4)?,
        ac_rate: row.get(5)?,
        status: row.get(6)?,
    })
}

impl ToSql for Difficulty {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Difficulty {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for SolveStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SolveStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
