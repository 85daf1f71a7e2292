//! Patient record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable patient identifier.
pub type PatientId = Uuid;

/// A person who can be booked into appointments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub age: i32,
    pub address: String,
}

impl Patient {
    /// Creates a patient with a freshly generated id.
    pub fn new(name: impl Into<String>, age: i32, address: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, age, address)
    }

    /// Creates a patient with a caller-provided id.
    ///
    /// Used when replacing an existing record or decoding a stored row.
    pub fn with_id(
        id: PatientId,
        name: impl Into<String>,
        age: i32,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            address: address.into(),
        }
    }
}
