//! Hospital scheduling service facade.
//!
//! # Responsibility
//! - Provide one entry point per scheduling use-case.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository transaction contracts.
//! - The service owns no connection; repositories borrow the caller's.

use crate::model::appointment::{Appointment, AppointmentDetail, AppointmentId};
use crate::model::doctor::{Doctor, DoctorId};
use crate::model::patient::{Patient, PatientId};
use crate::repo::appointment_repo::{AppointmentRepository, SqliteAppointmentRepository};
use crate::repo::doctor_repo::{DoctorRepository, SqliteDoctorRepository};
use crate::repo::patient_repo::{PatientRepository, SqlitePatientRepository};
use crate::repo::{DeleteOutcome, DeletePolicy, RepoResult};
use rusqlite::Connection;

/// Service facade over patient, doctor and appointment repositories.
pub struct HospitalService<P, D, A>
where
    P: PatientRepository,
    D: DoctorRepository,
    A: AppointmentRepository,
{
    patients: P,
    doctors: D,
    appointments: A,
}

/// Service wired to SQLite repositories borrowing one connection.
pub type SqliteHospitalService<'conn> = HospitalService<
    SqlitePatientRepository<'conn>,
    SqliteDoctorRepository<'conn>,
    SqliteAppointmentRepository<'conn>,
>;

impl<'conn> SqliteHospitalService<'conn> {
    /// Builds the service over a migrated connection.
    ///
    /// Fails when the connection schema is missing or outdated.
    pub fn try_from_connection(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqlitePatientRepository::try_new(conn)?,
            SqliteDoctorRepository::try_new(conn)?,
            SqliteAppointmentRepository::try_new(conn)?,
        ))
    }
}

impl<P, D, A> HospitalService<P, D, A>
where
    P: PatientRepository,
    D: DoctorRepository,
    A: AppointmentRepository,
{
    /// Creates a service from repository implementations.
    pub fn new(patients: P, doctors: D, appointments: A) -> Self {
        Self {
            patients,
            doctors,
            appointments,
        }
    }

    pub fn list_patients(&self) -> RepoResult<Vec<Patient>> {
        self.patients.list_patients()
    }

    pub fn get_patient(&self, id: PatientId) -> RepoResult<Patient> {
        self.patients.get_patient(id)
    }

    /// Resolves exactly one patient by name (`NotFound` / `Ambiguous`).
    pub fn find_patient_by_name(&self, name: &str) -> RepoResult<Patient> {
        self.patients.find_patient_by_name(name)
    }

    pub fn add_patient(&self, name: &str, age: i32, address: &str) -> RepoResult<PatientId> {
        self.patients.add_patient(name, age, address)
    }

    pub fn replace_patient(&self, patient: &Patient) -> RepoResult<()> {
        self.patients.replace_patient(patient)
    }

    /// Deletes a patient; see [`DeletePolicy`] for referenced patients.
    pub fn delete_patient(&self, id: PatientId, policy: DeletePolicy) -> RepoResult<DeleteOutcome> {
        self.patients.delete_patient(id, policy)
    }

    pub fn list_doctors(&self) -> RepoResult<Vec<Doctor>> {
        self.doctors.list_doctors()
    }

    /// Lists doctors by exact, case-sensitive specialization.
    pub fn list_doctors_by_specialization(&self, specialization: &str) -> RepoResult<Vec<Doctor>> {
        self.doctors.list_doctors_by_specialization(specialization)
    }

    pub fn get_doctor(&self, id: DoctorId) -> RepoResult<Doctor> {
        self.doctors.get_doctor(id)
    }

    /// Resolves exactly one doctor by name (`NotFound` / `Ambiguous`).
    pub fn find_doctor_by_name(&self, name: &str) -> RepoResult<Doctor> {
        self.doctors.find_doctor_by_name(name)
    }

    pub fn add_doctor(&self, name: &str, specialization: &str) -> RepoResult<DoctorId> {
        self.doctors.add_doctor(name, specialization)
    }

    pub fn replace_doctor(&self, doctor: &Doctor) -> RepoResult<()> {
        self.doctors.replace_doctor(doctor)
    }

    /// Deletes a doctor; see [`DeletePolicy`] for referenced doctors.
    pub fn delete_doctor(&self, id: DoctorId, policy: DeletePolicy) -> RepoResult<DeleteOutcome> {
        self.doctors.delete_doctor(id, policy)
    }

    pub fn list_appointments(&self) -> RepoResult<Vec<AppointmentDetail>> {
        self.appointments.list_appointments()
    }

    /// Lists appointments of every patient named exactly `name`.
    pub fn list_appointments_by_patient_name(
        &self,
        name: &str,
    ) -> RepoResult<Vec<AppointmentDetail>> {
        self.appointments.list_appointments_by_patient_name(name)
    }

    pub fn get_appointment(&self, id: AppointmentId) -> RepoResult<AppointmentDetail> {
        self.appointments.get_appointment(id)
    }

    /// Books an appointment by patient and doctor names.
    ///
    /// # Contract
    /// - Each name must match exactly one record.
    /// - On any failure no appointment is created.
    pub fn add_appointment(
        &self,
        date: i64,
        patient_name: &str,
        doctor_name: &str,
    ) -> RepoResult<AppointmentId> {
        self.appointments
            .add_appointment(date, patient_name, doctor_name)
    }

    /// Books an appointment by patient and doctor ids.
    pub fn add_appointment_for(
        &self,
        date: i64,
        patient_id: PatientId,
        doctor_id: DoctorId,
    ) -> RepoResult<AppointmentId> {
        self.appointments
            .add_appointment_for(date, patient_id, doctor_id)
    }

    pub fn replace_appointment(&self, appointment: &Appointment) -> RepoResult<()> {
        self.appointments.replace_appointment(appointment)
    }

    /// Deletes an appointment. `Ok(false)` means the id did not exist.
    pub fn delete_appointment(&self, id: AppointmentId) -> RepoResult<bool> {
        self.appointments.delete_appointment(id)
    }
}
