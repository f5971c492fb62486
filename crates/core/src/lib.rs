//! # Tutorbook Core
//!
//! Domain types for the teacher time-slot reservation service: weekly
//! availability windows, the reservation ledger entry, the shared error
//! taxonomy, and the weekday/time-of-day parsing used to validate input
//! before it reaches storage.

pub mod errors;
pub mod models;
pub mod time;
