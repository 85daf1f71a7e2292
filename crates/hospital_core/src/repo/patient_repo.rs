//! Patient repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/replace/delete APIs over the `patients` table.
//! - Own name resolution for patients (exactly one match or an error).
//!
//! # Invariants
//! - Listings are in insertion (`rowid`) order.
//! - Restricted deletes never remove a patient that appointments reference.

use crate::db::with_write_tx;
use crate::model::patient::{Patient, PatientId};
use crate::repo::{
    count_referencing_appointments, ensure_table_ready, parse_uuid, DeleteOutcome, DeletePolicy,
    EntityKind, RepoError, RepoResult,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PATIENT_COLUMNS: &[&str] = &["uuid", "name", "age", "address"];

const PATIENT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    age,
    address
FROM patients";

/// Repository interface for patient records.
pub trait PatientRepository {
    /// Inserts a new patient and returns its generated id.
    fn add_patient(&self, name: &str, age: i32, address: &str) -> RepoResult<PatientId>;
    /// Loads one patient, `NotFound` when absent.
    fn get_patient(&self, id: PatientId) -> RepoResult<Patient>;
    /// Lists all patients in insertion order.
    fn list_patients(&self) -> RepoResult<Vec<Patient>>;
    /// Resolves exactly one patient by exact name.
    fn find_patient_by_name(&self, name: &str) -> RepoResult<Patient>;
    /// Replaces every field of an existing patient.
    fn replace_patient(&self, patient: &Patient) -> RepoResult<()>;
    /// Deletes one patient; a missing id is a no-op.
    fn delete_patient(&self, id: PatientId, policy: DeletePolicy) -> RepoResult<DeleteOutcome>;
}

/// SQLite-backed patient repository.
pub struct SqlitePatientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePatientRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "patients", PATIENT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl PatientRepository for SqlitePatientRepository<'_> {
    fn add_patient(&self, name: &str, age: i32, address: &str) -> RepoResult<PatientId> {
        let patient = Patient::new(name, age, address);
        with_write_tx(self.conn, "add_patient", |tx| -> RepoResult<PatientId> {
            tx.execute(
                "INSERT INTO patients (uuid, name, age, address) VALUES (?1, ?2, ?3, ?4);",
                params![
                    patient.id.to_string(),
                    patient.name.as_str(),
                    patient.age,
                    patient.address.as_str(),
                ],
            )?;
            Ok(patient.id)
        })
    }

    fn get_patient(&self, id: PatientId) -> RepoResult<Patient> {
        load_patient(self.conn, id)?
            .ok_or_else(|| RepoError::not_found_id(EntityKind::Patient, id))
    }

    fn list_patients(&self) -> RepoResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PATIENT_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut patients = Vec::new();
        while let Some(row) = rows.next()? {
            patients.push(parse_patient_row(row)?);
        }
        Ok(patients)
    }

    fn find_patient_by_name(&self, name: &str) -> RepoResult<Patient> {
        resolve_patient_by_name(self.conn, name)
    }

    fn replace_patient(&self, patient: &Patient) -> RepoResult<()> {
        with_write_tx(self.conn, "replace_patient", |tx| -> RepoResult<()> {
            let changed = tx.execute(
                "UPDATE patients
                 SET
                    name = ?2,
                    age = ?3,
                    address = ?4
                 WHERE uuid = ?1;",
                params![
                    patient.id.to_string(),
                    patient.name.as_str(),
                    patient.age,
                    patient.address.as_str(),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found_id(EntityKind::Patient, patient.id));
            }
            Ok(())
        })
    }

    fn delete_patient(&self, id: PatientId, policy: DeletePolicy) -> RepoResult<DeleteOutcome> {
        let outcome = with_write_tx(
            self.conn,
            "delete_patient",
            |tx| -> RepoResult<DeleteOutcome> {
                if load_patient(tx, id)?.is_none() {
                    return Ok(DeleteOutcome::default());
                }

                let referencing = count_referencing_appointments(tx, "patient_uuid", id)?;
                let cascaded_appointments = match policy {
                    DeletePolicy::Restrict if referencing > 0 => {
                        return Err(RepoError::ReferencedByOthers {
                            entity: EntityKind::Patient,
                            id,
                            appointments: referencing,
                        });
                    }
                    DeletePolicy::Restrict => 0,
                    DeletePolicy::Cascade => tx.execute(
                        "DELETE FROM appointments WHERE patient_uuid = ?1;",
                        [id.to_string()],
                    )?,
                };

                tx.execute("DELETE FROM patients WHERE uuid = ?1;", [id.to_string()])?;
                Ok(DeleteOutcome {
                    removed: true,
                    cascaded_appointments,
                })
            },
        )?;

        info!(
            "event=patient_delete module=repo status=ok patient_id={} removed={} cascaded_appointments={}",
            id, outcome.removed, outcome.cascaded_appointments
        );
        Ok(outcome)
    }
}

/// Loads one patient by id on any connection or transaction.
pub(crate) fn load_patient(conn: &Connection, id: PatientId) -> RepoResult<Option<Patient>> {
    let mut stmt = conn.prepare(&format!("{PATIENT_SELECT_SQL} WHERE uuid = ?1;"))?;
    let patient = stmt
        .query_row([id.to_string()], |row| Ok(parse_patient_row(row)))
        .optional()?;
    patient.transpose()
}

/// Resolves exactly one patient whose name equals `name`.
///
/// # Errors
/// - `NotFound` when no patient has that name.
/// - `Ambiguous` when more than one patient has that name.
pub(crate) fn resolve_patient_by_name(conn: &Connection, name: &str) -> RepoResult<Patient> {
    let mut stmt = conn.prepare(&format!(
        "{PATIENT_SELECT_SQL} WHERE name = ?1 ORDER BY rowid ASC;"
    ))?;
    let mut rows = stmt.query([name])?;
    let mut matches = Vec::new();
    while let Some(row) = rows.next()? {
        matches.push(parse_patient_row(row)?);
    }

    match matches.len() {
        0 => Err(RepoError::not_found_name(EntityKind::Patient, name)),
        1 => Ok(matches.remove(0)),
        count => Err(RepoError::Ambiguous {
            entity: EntityKind::Patient,
            name: name.to_string(),
            matches: count,
        }),
    }
}

fn parse_patient_row(row: &Row<'_>) -> RepoResult<Patient> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Patient {
        id: parse_uuid(&uuid_text, "patients.uuid")?,
        name: row.get("name")?,
        age: row.get("age")?,
        address: row.get("address")?,
    })
}
