//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or a transaction connection) as the first argument.

pub mod patient_repo;
pub mod reading_repo;

pub use patient_repo::PatientRepo;
pub use reading_repo::ReadingRepo;
