//! Core scheduling data access for the hospital store.
//! This crate owns patients, doctors and appointments and the transactional
//! rules that keep their references consistent.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::HospitalConfig;
pub use db::{open_configured, open_db, open_db_in_memory, with_write_tx, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::appointment::{Appointment, AppointmentDetail, AppointmentId};
pub use model::doctor::{Doctor, DoctorId};
pub use model::patient::{Patient, PatientId};
pub use repo::appointment_repo::{AppointmentRepository, SqliteAppointmentRepository};
pub use repo::doctor_repo::{DoctorRepository, SqliteDoctorRepository};
pub use repo::patient_repo::{PatientRepository, SqlitePatientRepository};
pub use repo::{DeleteOutcome, DeletePolicy, EntityKind, LookupKey, RepoError, RepoResult};
pub use service::hospital_service::{HospitalService, SqliteHospitalService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
