//! Doctor record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable doctor identifier.
pub type DoctorId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    /// Matched case-sensitively by specialization listings.
    pub specialization: String,
}

impl Doctor {
    /// Creates a doctor with a freshly generated id.
    pub fn new(name: impl Into<String>, specialization: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, specialization)
    }

    /// Creates a doctor with a caller-provided id.
    pub fn with_id(
        id: DoctorId,
        name: impl Into<String>,
        specialization: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            specialization: specialization.into(),
        }
    }
}
