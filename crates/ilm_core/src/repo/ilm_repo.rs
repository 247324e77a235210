//! Indexed-note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the canonical `ilms` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Ilm::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - A path uniqueness violation surfaces as `PathConflict`, never as a
//!   generic transport error.

use crate::db::DbError;
use crate::model::ilm::{Ilm, IlmValidationError};
use crate::note::{DATETIME_FORMAT, DATE_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ILM_SELECT_SQL: &str = "SELECT
    ilm_id,
    zot_key,
    path,
    created_date,
    review_date,
    score,
    multiplier
FROM ilms";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for index persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(IlmValidationError),
    Db(DbError),
    NotFound(String),
    /// Another row already owns the target path (stale index entry).
    PathConflict { path: String },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "ilm not found: {id}"),
            Self::PathConflict { path } => {
                write!(f, "another indexed note already owns path `{path}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted ilm data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IlmValidationError> for RepoError {
    fn from(value: IlmValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for indexed-note CRUD operations.
pub trait IlmRepository {
    fn create(&self, ilm: &Ilm) -> RepoResult<()>;
    fn update(&self, ilm: &Ilm) -> RepoResult<()>;
    fn get(&self, ilm_id: &str) -> RepoResult<Option<Ilm>>;
    fn list(&self) -> RepoResult<Vec<Ilm>>;
    fn list_ids(&self) -> RepoResult<Vec<String>>;
    fn due_on(&self, date: NaiveDate) -> RepoResult<Vec<Ilm>>;
    fn delete_by_path(&self, path: &str) -> RepoResult<bool>;
    fn delete_ids(&self, ilm_ids: &[String]) -> RepoResult<usize>;
}

/// SQLite-backed indexed-note repository.
pub struct SqliteIlmRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIlmRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl IlmRepository for SqliteIlmRepository<'_> {
    fn create(&self, ilm: &Ilm) -> RepoResult<()> {
        ilm.validate()?;

        let result = self.conn.execute(
            "INSERT INTO ilms (
                ilm_id,
                zot_key,
                path,
                created_date,
                review_date,
                score,
                multiplier
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                ilm.ilm_id,
                ilm.zot_key.as_deref(),
                ilm.path,
                format_datetime(ilm.created_date),
                format_date(ilm.review_date),
                ilm.score,
                ilm.multiplier,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_path_conflict(&err) => Err(RepoError::PathConflict {
                path: ilm.path.clone(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, ilm: &Ilm) -> RepoResult<()> {
        ilm.validate()?;

        let changed = self.conn.execute(
            "UPDATE ilms
             SET
                zot_key = ?1,
                path = ?2,
                created_date = ?3,
                review_date = ?4,
                score = ?5,
                multiplier = ?6
             WHERE ilm_id = ?7;",
            params![
                ilm.zot_key.as_deref(),
                ilm.path,
                format_datetime(ilm.created_date),
                format_date(ilm.review_date),
                ilm.score,
                ilm.multiplier,
                ilm.ilm_id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(ilm.ilm_id.clone()));
        }

        Ok(())
    }

    fn get(&self, ilm_id: &str) -> RepoResult<Option<Ilm>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ILM_SELECT_SQL} WHERE ilm_id = ?1;"))?;

        let mut rows = stmt.query([ilm_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_ilm_row(row)?));
        }

        Ok(None)
    }

    fn list(&self) -> RepoResult<Vec<Ilm>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ILM_SELECT_SQL} ORDER BY ilm_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut ilms = Vec::new();

        while let Some(row) = rows.next()? {
            ilms.push(parse_ilm_row(row)?);
        }

        Ok(ilms)
    }

    fn list_ids(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT ilm_id FROM ilms;")?;
        let mut rows = stmt.query([])?;
        let mut ids = Vec::new();

        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }

        Ok(ids)
    }

    fn due_on(&self, date: NaiveDate) -> RepoResult<Vec<Ilm>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ILM_SELECT_SQL} WHERE review_date = ?1 ORDER BY ilm_id ASC;"
        ))?;
        let mut rows = stmt.query([format_date(date)])?;
        let mut ilms = Vec::new();

        while let Some(row) = rows.next()? {
            ilms.push(parse_ilm_row(row)?);
        }

        Ok(ilms)
    }

    fn delete_by_path(&self, path: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM ilms WHERE path = ?1;", [path])?;
        Ok(changed > 0)
    }

    fn delete_ids(&self, ilm_ids: &[String]) -> RepoResult<usize> {
        if ilm_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = (1..=ilm_ids.len())
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let changed = self.conn.execute(
            &format!("DELETE FROM ilms WHERE ilm_id IN ({placeholders});"),
            params_from_iter(ilm_ids.iter()),
        )?;

        Ok(changed)
    }
}

fn parse_ilm_row(row: &Row<'_>) -> RepoResult<Ilm> {
    let created_text: String = row.get("created_date")?;
    let created_date = parse_datetime(&created_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid datetime `{created_text}` in ilms.created_date"
        ))
    })?;

    let review_text: String = row.get("review_date")?;
    let review_date = parse_date(&review_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid date `{review_text}` in ilms.review_date"))
    })?;

    let ilm = Ilm {
        ilm_id: row.get("ilm_id")?,
        zot_key: row.get("zot_key")?,
        path: row.get("path")?,
        created_date,
        review_date,
        score: row.get("score")?,
        multiplier: row.get("multiplier")?,
    };
    ilm.validate()?;
    Ok(ilm)
}

fn is_path_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, Some(message))
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
                && message.contains("ilms.path")
    )
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_datetime(datetime: NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).ok()
}
