//! Doctor repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/replace/delete APIs over the `doctors` table.
//! - Own exact-match specialization listing and doctor name resolution.
//!
//! # Invariants
//! - Specialization and name matching is exact and case-sensitive.
//! - An empty specialization filter matches only empty specializations.
//! - Doctor names carry no uniqueness constraint.

use crate::db::with_write_tx;
use crate::model::doctor::{Doctor, DoctorId};
use crate::repo::{
    count_referencing_appointments, ensure_table_ready, parse_uuid, DeleteOutcome, DeletePolicy,
    EntityKind, RepoError, RepoResult,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const DOCTOR_COLUMNS: &[&str] = &["uuid", "name", "specialization"];

const DOCTOR_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    specialization
FROM doctors";

/// Repository interface for doctor records.
pub trait DoctorRepository {
    /// Inserts a new doctor and returns its generated id.
    fn add_doctor(&self, name: &str, specialization: &str) -> RepoResult<DoctorId>;
    /// Loads one doctor, `NotFound` when absent.
    fn get_doctor(&self, id: DoctorId) -> RepoResult<Doctor>;
    /// Lists all doctors in insertion order.
    fn list_doctors(&self) -> RepoResult<Vec<Doctor>>;
    /// Lists doctors whose specialization equals `specialization` exactly.
    fn list_doctors_by_specialization(&self, specialization: &str) -> RepoResult<Vec<Doctor>>;
    /// Resolves exactly one doctor by exact name.
    fn find_doctor_by_name(&self, name: &str) -> RepoResult<Doctor>;
    /// Replaces every field of an existing doctor.
    fn replace_doctor(&self, doctor: &Doctor) -> RepoResult<()>;
    /// Deletes one doctor; a missing id is a no-op.
    fn delete_doctor(&self, id: DoctorId, policy: DeletePolicy) -> RepoResult<DeleteOutcome>;
}

/// SQLite-backed doctor repository.
pub struct SqliteDoctorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDoctorRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "doctors", DOCTOR_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_doctors(&self, filter: Option<&str>) -> RepoResult<Vec<Doctor>> {
        let mut sql = format!("{DOCTOR_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(specialization) = filter {
            sql.push_str(" AND specialization = ? COLLATE BINARY");
            bind_values.push(Value::Text(specialization.to_string()));
        }
        sql.push_str(" ORDER BY rowid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut doctors = Vec::new();
        while let Some(row) = rows.next()? {
            doctors.push(parse_doctor_row(row)?);
        }
        Ok(doctors)
    }
}

impl DoctorRepository for SqliteDoctorRepository<'_> {
    fn add_doctor(&self, name: &str, specialization: &str) -> RepoResult<DoctorId> {
        let doctor = Doctor::new(name, specialization);
        with_write_tx(self.conn, "add_doctor", |tx| -> RepoResult<DoctorId> {
            tx.execute(
                "INSERT INTO doctors (uuid, name, specialization) VALUES (?1, ?2, ?3);",
                params![
                    doctor.id.to_string(),
                    doctor.name.as_str(),
                    doctor.specialization.as_str(),
                ],
            )?;
            Ok(doctor.id)
        })
    }

    fn get_doctor(&self, id: DoctorId) -> RepoResult<Doctor> {
        load_doctor(self.conn, id)?.ok_or_else(|| RepoError::not_found_id(EntityKind::Doctor, id))
    }

    fn list_doctors(&self) -> RepoResult<Vec<Doctor>> {
        self.query_doctors(None)
    }

    fn list_doctors_by_specialization(&self, specialization: &str) -> RepoResult<Vec<Doctor>> {
        self.query_doctors(Some(specialization))
    }

    fn find_doctor_by_name(&self, name: &str) -> RepoResult<Doctor> {
        resolve_doctor_by_name(self.conn, name)
    }

    fn replace_doctor(&self, doctor: &Doctor) -> RepoResult<()> {
        with_write_tx(self.conn, "replace_doctor", |tx| -> RepoResult<()> {
            let changed = tx.execute(
                "UPDATE doctors
                 SET
                    name = ?2,
                    specialization = ?3
                 WHERE uuid = ?1;",
                params![
                    doctor.id.to_string(),
                    doctor.name.as_str(),
                    doctor.specialization.as_str(),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found_id(EntityKind::Doctor, doctor.id));
            }
            Ok(())
        })
    }

    fn delete_doctor(&self, id: DoctorId, policy: DeletePolicy) -> RepoResult<DeleteOutcome> {
        let outcome = with_write_tx(
            self.conn,
            "delete_doctor",
            |tx| -> RepoResult<DeleteOutcome> {
                if load_doctor(tx, id)?.is_none() {
                    return Ok(DeleteOutcome::default());
                }

                let referencing = count_referencing_appointments(tx, "doctor_uuid", id)?;
                if policy == DeletePolicy::Restrict && referencing > 0 {
                    return Err(RepoError::ReferencedByOthers {
                        entity: EntityKind::Doctor,
                        id,
                        appointments: referencing,
                    });
                }

                let cascaded_appointments = if policy == DeletePolicy::Cascade {
                    tx.execute(
                        "DELETE FROM appointments WHERE doctor_uuid = ?1;",
                        [id.to_string()],
                    )?
                } else {
                    0
                };
                tx.execute("DELETE FROM doctors WHERE uuid = ?1;", [id.to_string()])?;

                Ok(DeleteOutcome {
                    removed: true,
                    cascaded_appointments,
                })
            },
        )?;

        info!(
            "event=doctor_delete module=repo status=ok doctor_id={} removed={} cascaded_appointments={}",
            id, outcome.removed, outcome.cascaded_appointments
        );
        Ok(outcome)
    }
}

/// Loads one doctor by id on any connection or transaction.
pub(crate) fn load_doctor(conn: &Connection, id: DoctorId) -> RepoResult<Option<Doctor>> {
    let mut stmt = conn.prepare(&format!("{DOCTOR_SELECT_SQL} WHERE uuid = ?1;"))?;
    let doctor = stmt
        .query_row([id.to_string()], |row| Ok(parse_doctor_row(row)))
        .optional()?;
    doctor.transpose()
}

/// Resolves exactly one doctor whose name equals `name`.
///
/// # Errors
/// - `NotFound` when no doctor has that name.
/// - `Ambiguous` when more than one doctor has that name.
pub(crate) fn resolve_doctor_by_name(conn: &Connection, name: &str) -> RepoResult<Doctor> {
    let mut stmt = conn.prepare(&format!(
        "{DOCTOR_SELECT_SQL} WHERE name = ?1 ORDER BY rowid ASC;"
    ))?;
    let mut rows = stmt.query([name])?;
    let mut matches = Vec::new();
    while let Some(row) = rows.next()? {
        matches.push(parse_doctor_row(row)?);
    }

    if matches.len() > 1 {
        return Err(RepoError::Ambiguous {
            entity: EntityKind::Doctor,
            name: name.to_string(),
            matches: matches.len(),
        });
    }
    matches
        .pop()
        .ok_or_else(|| RepoError::not_found_name(EntityKind::Doctor, name))
}

fn parse_doctor_row(row: &Row<'_>) -> RepoResult<Doctor> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Doctor {
        id: parse_uuid(&uuid_text, "doctors.uuid")?,
        name: row.get("name")?,
        specialization: row.get("specialization")?,
    })
}
