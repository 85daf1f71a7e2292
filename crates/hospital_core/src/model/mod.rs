//! Scheduling domain model.
//!
//! # Responsibility
//! - Define the patient, doctor and appointment records exchanged with
//!   repositories.
//!
//! # Invariants
//! - Every record is identified by a generated UUID that is never reused.
//! - Records carry no validation; field checks belong to the caller.
//! - Appointments reference patients and doctors by id only.

pub mod appointment;
pub mod doctor;
pub mod patient;
