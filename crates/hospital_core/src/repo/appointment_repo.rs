//! Appointment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Create appointments atomically: resolve both references, then insert.
//! - Return appointments joined with the patient and doctor they reference.
//!
//! # Invariants
//! - Creation and replacement verify both references inside the same
//!   transaction as the write; any failure leaves no appointment row behind.
//! - Name-based creation requires exactly one patient and exactly one doctor
//!   match.
//! - Reads tolerate dangling references (`None` in the joined read model).

use crate::db::with_write_tx;
use crate::model::appointment::{Appointment, AppointmentDetail, AppointmentId};
use crate::model::doctor::{Doctor, DoctorId};
use crate::model::patient::{Patient, PatientId};
use crate::repo::doctor_repo::{load_doctor, resolve_doctor_by_name};
use crate::repo::patient_repo::{load_patient, resolve_patient_by_name};
use crate::repo::{ensure_table_ready, parse_uuid, EntityKind, RepoError, RepoResult};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const APPOINTMENT_COLUMNS: &[&str] = &["uuid", "scheduled_at", "patient_uuid", "doctor_uuid"];

const APPOINTMENT_DETAIL_SELECT_SQL: &str = "SELECT
    a.uuid AS appointment_uuid,
    a.scheduled_at AS scheduled_at,
    a.patient_uuid AS patient_ref,
    a.doctor_uuid AS doctor_ref,
    p.uuid AS patient_uuid,
    p.name AS patient_name,
    p.age AS patient_age,
    p.address AS patient_address,
    d.uuid AS doctor_uuid,
    d.name AS doctor_name,
    d.specialization AS doctor_specialization
FROM appointments a
LEFT JOIN patients p ON p.uuid = a.patient_uuid
LEFT JOIN doctors d ON d.uuid = a.doctor_uuid";

/// Repository interface for appointment records.
pub trait AppointmentRepository {
    /// Books `patient_name` with `doctor_name` at `date` (epoch ms).
    ///
    /// Both names must match exactly one record.
    fn add_appointment(
        &self,
        date: i64,
        patient_name: &str,
        doctor_name: &str,
    ) -> RepoResult<AppointmentId>;
    /// Books an appointment from patient and doctor ids.
    fn add_appointment_for(
        &self,
        date: i64,
        patient_id: PatientId,
        doctor_id: DoctorId,
    ) -> RepoResult<AppointmentId>;
    /// Loads one appointment with its references, `NotFound` when absent.
    fn get_appointment(&self, id: AppointmentId) -> RepoResult<AppointmentDetail>;
    /// Lists all appointments in insertion order.
    fn list_appointments(&self) -> RepoResult<Vec<AppointmentDetail>>;
    /// Lists appointments whose patient name equals `name` exactly.
    fn list_appointments_by_patient_name(&self, name: &str) -> RepoResult<Vec<AppointmentDetail>>;
    /// Replaces every field of an existing appointment.
    fn replace_appointment(&self, appointment: &Appointment) -> RepoResult<()>;
    /// Deletes one appointment. Returns `false` when the id did not exist.
    fn delete_appointment(&self, id: AppointmentId) -> RepoResult<bool>;
}

/// SQLite-backed appointment repository.
pub struct SqliteAppointmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAppointmentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "appointments", APPOINTMENT_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_details(&self, patient_name: Option<&str>) -> RepoResult<Vec<AppointmentDetail>> {
        let mut sql = format!("{APPOINTMENT_DETAIL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = patient_name {
            sql.push_str(" AND p.name = ?");
            bind_values.push(Value::Text(name.to_string()));
        }
        sql.push_str(" ORDER BY a.rowid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut details = Vec::new();
        while let Some(row) = rows.next()? {
            details.push(parse_detail_row(row)?);
        }
        Ok(details)
    }
}

impl AppointmentRepository for SqliteAppointmentRepository<'_> {
    fn add_appointment(
        &self,
        date: i64,
        patient_name: &str,
        doctor_name: &str,
    ) -> RepoResult<AppointmentId> {
        with_write_tx(
            self.conn,
            "add_appointment",
            |tx| -> RepoResult<AppointmentId> {
                let patient = resolve_patient_by_name(tx, patient_name)?;
                let doctor = resolve_doctor_by_name(tx, doctor_name)?;
                let appointment = Appointment::new(date, patient.id, doctor.id);
                insert_appointment(tx, &appointment)?;
                Ok(appointment.id)
            },
        )
    }

    fn add_appointment_for(
        &self,
        date: i64,
        patient_id: PatientId,
        doctor_id: DoctorId,
    ) -> RepoResult<AppointmentId> {
        with_write_tx(
            self.conn,
            "add_appointment_for",
            |tx| -> RepoResult<AppointmentId> {
                ensure_references_exist(tx, patient_id, doctor_id)?;
                let appointment = Appointment::new(date, patient_id, doctor_id);
                insert_appointment(tx, &appointment)?;
                Ok(appointment.id)
            },
        )
    }

    fn get_appointment(&self, id: AppointmentId) -> RepoResult<AppointmentDetail> {
        let mut stmt = self
            .conn
            .prepare(&format!("{APPOINTMENT_DETAIL_SELECT_SQL} WHERE a.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return parse_detail_row(row);
        }
        Err(RepoError::not_found_id(EntityKind::Appointment, id))
    }

    fn list_appointments(&self) -> RepoResult<Vec<AppointmentDetail>> {
        self.query_details(None)
    }

    fn list_appointments_by_patient_name(&self, name: &str) -> RepoResult<Vec<AppointmentDetail>> {
        self.query_details(Some(name))
    }

    fn replace_appointment(&self, appointment: &Appointment) -> RepoResult<()> {
        with_write_tx(self.conn, "replace_appointment", |tx| -> RepoResult<()> {
            if !appointment_exists(tx, appointment.id)? {
                return Err(RepoError::not_found_id(
                    EntityKind::Appointment,
                    appointment.id,
                ));
            }
            ensure_references_exist(tx, appointment.patient_id, appointment.doctor_id)?;

            tx.execute(
                "UPDATE appointments
                 SET
                    scheduled_at = ?2,
                    patient_uuid = ?3,
                    doctor_uuid = ?4
                 WHERE uuid = ?1;",
                params![
                    appointment.id.to_string(),
                    appointment.date,
                    appointment.patient_id.to_string(),
                    appointment.doctor_id.to_string(),
                ],
            )?;
            Ok(())
        })
    }

    fn delete_appointment(&self, id: AppointmentId) -> RepoResult<bool> {
        let changed = with_write_tx(self.conn, "delete_appointment", |tx| -> RepoResult<usize> {
            Ok(tx.execute(
                "DELETE FROM appointments WHERE uuid = ?1;",
                [id.to_string()],
            )?)
        })?;

        debug!(
            "event=appointment_delete module=repo status=ok appointment_id={} removed={}",
            id,
            changed > 0
        );
        Ok(changed > 0)
    }
}

fn insert_appointment(conn: &Connection, appointment: &Appointment) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO appointments (uuid, scheduled_at, patient_uuid, doctor_uuid)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            appointment.id.to_string(),
            appointment.date,
            appointment.patient_id.to_string(),
            appointment.doctor_id.to_string(),
        ],
    )?;
    info!(
        "event=appointment_create module=repo status=ok appointment_id={} patient_id={} doctor_id={}",
        appointment.id, appointment.patient_id, appointment.doctor_id
    );
    Ok(())
}

fn ensure_references_exist(
    conn: &Connection,
    patient_id: PatientId,
    doctor_id: DoctorId,
) -> RepoResult<()> {
    if load_patient(conn, patient_id)?.is_none() {
        return Err(RepoError::not_found_id(EntityKind::Patient, patient_id));
    }
    if load_doctor(conn, doctor_id)?.is_none() {
        return Err(RepoError::not_found_id(EntityKind::Doctor, doctor_id));
    }
    Ok(())
}

fn appointment_exists(conn: &Connection, id: AppointmentId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM appointments WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_detail_row(row: &Row<'_>) -> RepoResult<AppointmentDetail> {
    let appointment_uuid: String = row.get("appointment_uuid")?;
    let patient_ref: String = row.get("patient_ref")?;
    let doctor_ref: String = row.get("doctor_ref")?;
    let appointment = Appointment {
        id: parse_uuid(&appointment_uuid, "appointments.uuid")?,
        date: row.get("scheduled_at")?,
        patient_id: parse_uuid(&patient_ref, "appointments.patient_uuid")?,
        doctor_id: parse_uuid(&doctor_ref, "appointments.doctor_uuid")?,
    };

    // LEFT JOIN: a missing referenced row yields NULL columns.
    let patient = match row.get::<_, Option<String>>("patient_uuid")? {
        Some(_) => Some(Patient {
            id: appointment.patient_id,
            name: row.get("patient_name")?,
            age: row.get("patient_age")?,
            address: row.get("patient_address")?,
        }),
        None => None,
    };
    let doctor = match row.get::<_, Option<String>>("doctor_uuid")? {
        Some(_) => Some(Doctor {
            id: appointment.doctor_id,
            name: row.get("doctor_name")?,
            specialization: row.get("doctor_specialization")?,
        }),
        None => None,
    };

    Ok(AppointmentDetail {
        appointment,
        patient,
        doctor,
    })
}
