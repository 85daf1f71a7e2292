//! Scoped write-transaction helper.
//!
//! # Responsibility
//! - Wrap every repository write in one `IMMEDIATE` transaction.
//! - Resolve the transaction before control returns to the caller.
//!
//! # Invariants
//! - Lifecycle is `Idle -> Active -> Committed | RolledBack`.
//! - `work` returning `Err` rolls back before the error is returned.
//! - A panic inside `work` rolls back through `Transaction` drop behavior.
//! - Nested writes on the same connection fail instead of joining the outer
//!   transaction.

use super::DbError;
use log::{debug, error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Stable, metadata-only error code used in transaction log events.
///
/// Error messages may carry user-provided text (names), so logs only carry
/// this code.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

impl ErrorCode for rusqlite::Error {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation => {
                "db_constraint"
            }
            Self::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::DatabaseBusy => {
                "db_busy"
            }
            _ => "db_error",
        }
    }
}

impl ErrorCode for DbError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Sqlite(err) => err.error_code(),
            Self::UnsupportedSchemaVersion { .. } => "db_schema_unsupported",
        }
    }
}

/// Runs `work` inside one write transaction on `conn`.
///
/// Commits when `work` returns `Ok`, rolls back otherwise. `operation` names
/// the calling use-case in `tx` log events.
///
/// # Errors
/// - Returns the store error when the transaction cannot begin or commit.
/// - Returns `work`'s error unchanged after rollback.
pub fn with_write_tx<T, E, F>(conn: &Connection, operation: &'static str, work: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error> + ErrorCode,
{
    let started_at = Instant::now();
    let tx = match Transaction::new_unchecked(conn, TransactionBehavior::Immediate) {
        Ok(tx) => tx,
        Err(err) => {
            error!(
                "event=tx module=db op={} status=error stage=begin error_code={}",
                operation,
                err.error_code()
            );
            return Err(err.into());
        }
    };

    match work(&tx) {
        Ok(value) => {
            if let Err(err) = tx.commit() {
                error!(
                    "event=tx module=db op={} status=error stage=commit duration_ms={} error_code={}",
                    operation,
                    started_at.elapsed().as_millis(),
                    err.error_code()
                );
                return Err(err.into());
            }
            debug!(
                "event=tx module=db op={} status=committed duration_ms={}",
                operation,
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event=tx module=db op={} status=error stage=rollback error_code={}",
                    operation,
                    rollback_err.error_code()
                );
            }
            info!(
                "event=tx module=db op={} status=rolled_back duration_ms={} error_code={}",
                operation,
                started_at.elapsed().as_millis(),
                err.error_code()
            );
            Err(err)
        }
    }
}
