//! Per-patient time-series storage.
//!
//! [`PatientStore`] is the contract every backend honours; the request layer
//! holds it as `Arc<dyn PatientStore>` so the in-memory map and the
//! PostgreSQL adapter (`sentinel-db`) are interchangeable.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::patient::{NewPatient, Patient, Reading};
use crate::types::PatientId;

pub mod memory;

pub use memory::MemoryStore;

/// Storage contract for patients and their append-only reading series.
///
/// Implementations must guarantee:
/// - at most one of several concurrent `register` calls for the same id
///   succeeds; the rest fail with [`CoreError::DuplicateKey`];
/// - appends for one patient are serialized and atomic, so readers see the
///   series either before or after an append, never in between;
/// - insertion order is the canonical order of the returned readings.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Create a patient with an empty series.
    async fn register(&self, new: NewPatient) -> Result<Patient, CoreError>;

    /// Append a reading and return the updated snapshot.
    async fn append_reading(&self, patient_id: &str, reading: Reading)
        -> Result<Patient, CoreError>;

    /// Fetch a snapshot of one patient.
    async fn get(&self, patient_id: &str) -> Result<Patient, CoreError>;

    /// Every patient keyed by id. Intended for diagnostics and tests.
    async fn list_all(&self) -> Result<BTreeMap<PatientId, Patient>, CoreError>;

    /// Remove a patient and its whole series. Returns `false` if absent.
    async fn remove(&self, patient_id: &str) -> Result<bool, CoreError>;

    /// Cheap liveness probe for the backing storage.
    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }
}
