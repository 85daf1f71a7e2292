//! Use-case services.
//!
//! # Responsibility
//! - Expose the scheduling data-access surface to command dispatchers.
//! - Keep callers decoupled from SQL and repository wiring.

pub mod hospital_service;
