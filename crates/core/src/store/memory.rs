use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PatientStore;
use crate::error::CoreError;
use crate::patient::{NewPatient, Patient, Reading};
use crate::types::PatientId;

/// In-process patient store.
///
/// The outer lock guards membership (registration and removal take it for
/// writing); each patient sits behind its own lock so appends to different
/// patients do not contend. Designed to be wrapped in `Arc` and shared.
#[derive(Default)]
pub struct MemoryStore {
    patients: RwLock<HashMap<PatientId, Arc<RwLock<Patient>>>>,
}

impl MemoryStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered patients.
    pub async fn len(&self) -> usize {
        self.patients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn register(&self, new: NewPatient) -> Result<Patient, CoreError> {
        let mut patients = self.patients.write().await;
        match patients.entry(new.patient_id.clone()) {
            Entry::Occupied(_) => Err(CoreError::duplicate_patient(new.patient_id)),
            Entry::Vacant(slot) => {
                let patient = Patient::from_new(new);
                slot.insert(Arc::new(RwLock::new(patient.clone())));
                tracing::debug!(patient_id = %patient.patient_id, "Patient registered");
                Ok(patient)
            }
        }
    }

    async fn append_reading(
        &self,
        patient_id: &str,
        reading: Reading,
    ) -> Result<Patient, CoreError> {
        // Hold the membership read lock so a concurrent remove cannot
        // interleave with the append.
        let patients = self.patients.read().await;
        let record = patients
            .get(patient_id)
            .ok_or_else(|| CoreError::patient_not_found(patient_id))?;
        let mut patient = record.write().await;
        patient.readings.push(reading);
        Ok(patient.clone())
    }

    async fn get(&self, patient_id: &str) -> Result<Patient, CoreError> {
        let patients = self.patients.read().await;
        let record = patients
            .get(patient_id)
            .ok_or_else(|| CoreError::patient_not_found(patient_id))?;
        let patient = record.read().await;
        Ok(patient.clone())
    }

    async fn list_all(&self) -> Result<BTreeMap<PatientId, Patient>, CoreError> {
        let patients = self.patients.read().await;
        let mut all = BTreeMap::new();
        for (id, record) in patients.iter() {
            all.insert(id.clone(), record.read().await.clone());
        }
        Ok(all)
    }

    async fn remove(&self, patient_id: &str) -> Result<bool, CoreError> {
        Ok(self.patients.write().await.remove(patient_id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
