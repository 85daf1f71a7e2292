//! Appointment record and its joined read model.
//!
//! # Invariants
//! - `patient_id` and `doctor_id` resolve to existing rows when the
//!   appointment is created or replaced.
//! - Later deletion of the referenced rows is governed by the caller's
//!   delete policy; readers must tolerate unresolved references.

use super::doctor::{Doctor, DoctorId};
use super::patient::{Patient, PatientId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable appointment identifier.
pub type AppointmentId = Uuid;

/// A booked visit of one patient with one doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    /// Unix epoch milliseconds.
    pub date: i64,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
}

impl Appointment {
    /// Creates an appointment with a freshly generated id.
    pub fn new(date: i64, patient_id: PatientId, doctor_id: DoctorId) -> Self {
        Self::with_id(Uuid::new_v4(), date, patient_id, doctor_id)
    }

    /// Creates an appointment with a caller-provided id.
    pub fn with_id(
        id: AppointmentId,
        date: i64,
        patient_id: PatientId,
        doctor_id: DoctorId,
    ) -> Self {
        Self {
            id,
            date,
            patient_id,
            doctor_id,
        }
    }
}

/// Appointment joined with the records it references.
///
/// `patient`/`doctor` are `None` when the referenced row no longer exists
/// (dangling reference).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub patient: Option<Patient>,
    pub doctor: Option<Doctor>,
}

impl AppointmentDetail {
    /// Returns whether either reference failed to resolve.
    pub fn is_dangling(&self) -> bool {
        self.patient.is_none() || self.doctor.is_none()
    }
}
