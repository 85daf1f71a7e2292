//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Keep SQL details inside the persistence boundary.
//! - Run every write inside [`crate::db::with_write_tx`].
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Ambiguous`,
//!   `ReferencedByOthers`) in addition to store errors.
//! - Name lookups never fall back to an unchecked first match.
//! - Deleting a missing id is a successful no-op.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::tx::ErrorCode;
use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod appointment_repo;
pub mod doctor_repo;
pub mod patient_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity family an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Patient,
    Doctor,
    Appointment,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patient => write!(f, "patient"),
            Self::Doctor => write!(f, "doctor"),
            Self::Appointment => write!(f, "appointment"),
        }
    }
}

/// Key used by a lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Id(Uuid),
    Name(String),
}

impl Display for LookupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "name `{name}`"),
        }
    }
}

/// Repository error for scheduling persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Store connectivity or transaction failure.
    Db(DbError),
    /// A lookup by id or name matched zero rows.
    NotFound { entity: EntityKind, key: LookupKey },
    /// A name lookup matched more than one row where exactly one was required.
    Ambiguous {
        entity: EntityKind,
        name: String,
        matches: usize,
    },
    /// Restricted delete of a record that appointments still reference.
    ReferencedByOthers {
        entity: EntityKind,
        id: Uuid,
        appointments: usize,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found_id(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound {
            entity,
            key: LookupKey::Id(id),
        }
    }

    pub(crate) fn not_found_name(entity: EntityKind, name: &str) -> Self {
        Self::NotFound {
            entity,
            key: LookupKey::Name(name.to_string()),
        }
    }

    /// Returns whether this error came from the store rather than from data.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Db(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::Ambiguous {
                entity,
                name,
                matches,
            } => write!(
                f,
                "{entity} name `{name}` is ambiguous: {matches} records match"
            ),
            Self::ReferencedByOthers {
                entity,
                id,
                appointments,
            } => write!(
                f,
                "{entity} {id} is referenced by {appointments} appointment(s)"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
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

impl ErrorCode for RepoError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Db(err) => err.error_code(),
            Self::NotFound { .. } => "not_found",
            Self::Ambiguous { .. } => "ambiguous",
            Self::ReferencedByOthers { .. } => "referenced_by_others",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) | Self::MissingRequiredColumn { .. } => {
                "schema_mismatch"
            }
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

/// Behavior when deleting a patient or doctor that appointments reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Reject with [`RepoError::ReferencedByOthers`]; nothing is deleted.
    Restrict,
    /// Delete referencing appointments together with the record.
    Cascade,
}

/// Result of a patient/doctor delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    /// `false` when the id did not exist (no-op).
    pub removed: bool,
    /// Appointments removed by [`DeletePolicy::Cascade`].
    pub cascaded_appointments: usize,
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

/// Verifies that `conn` is migrated and exposes `table` with `columns`.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

/// Counts appointments referencing `id` through `column`.
pub(crate) fn count_referencing_appointments(
    conn: &Connection,
    column: &'static str,
    id: Uuid,
) -> RepoResult<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM appointments WHERE {column} = ?1;"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative appointment count {count}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
