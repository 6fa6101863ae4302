//! The monitoring facade used by the request layer.
//!
//! [`MonitorService`] owns a handle to the store and the notification gate
//! and exposes the logical operations of the service. It is cheaply
//! cloneable and holds no process-global state.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::CoreError;
use crate::gate::NotificationGate;
use crate::patient::{NewPatient, Patient, Reading};
use crate::query::{self, LatestStatus};
use crate::store::PatientStore;
use crate::types::{HeartRate, PatientId, Timestamp};

/// Result of a successful append.
#[derive(Debug)]
pub struct Appended {
    /// The patient snapshot including the new reading.
    pub patient: Patient,
    /// Delivery task for a tachycardia notification, if one was fired.
    pub notification: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct MonitorService {
    store: Arc<dyn PatientStore>,
    gate: Arc<NotificationGate>,
}

impl MonitorService {
    pub fn new(store: Arc<dyn PatientStore>, gate: Arc<NotificationGate>) -> Self {
        Self { store, gate }
    }

    pub async fn register(&self, new: NewPatient) -> Result<Patient, CoreError> {
        let patient = self.store.register(new).await?;
        self.gate.track(&patient.patient_id).await;
        tracing::info!(patient_id = %patient.patient_id, age = patient.user_age, "Registered patient");
        Ok(patient)
    }

    /// Append a reading stamped with the current UTC time.
    pub async fn record_heart_rate(
        &self,
        patient_id: &str,
        heart_rate: HeartRate,
    ) -> Result<Appended, CoreError> {
        self.append_reading(patient_id, heart_rate, Timestamp::now())
            .await
    }

    /// Append a reading with an explicit timestamp, then run the
    /// notification gate on the committed snapshot.
    pub async fn append_reading(
        &self,
        patient_id: &str,
        heart_rate: HeartRate,
        timestamp: Timestamp,
    ) -> Result<Appended, CoreError> {
        let reading = Reading {
            heart_rate,
            timestamp,
        };
        let patient = self.store.append_reading(patient_id, reading).await?;
        tracing::debug!(patient_id, heart_rate, "Recorded heart rate");

        // The store has released its locks by the time the gate runs.
        let notification = self.gate.evaluate_and_notify(&patient).await;
        Ok(Appended {
            patient,
            notification,
        })
    }

    pub async fn get(&self, patient_id: &str) -> Result<Patient, CoreError> {
        self.store.get(patient_id).await
    }

    pub async fn list_all(&self) -> Result<BTreeMap<PatientId, Patient>, CoreError> {
        self.store.list_all().await
    }

    pub async fn remove(&self, patient_id: &str) -> Result<bool, CoreError> {
        let removed = self.store.remove(patient_id).await?;
        if removed {
            self.gate.forget(patient_id).await;
            tracing::info!(patient_id, "Removed patient");
        }
        Ok(removed)
    }

    pub async fn latest_status(&self, patient_id: &str) -> Result<LatestStatus, CoreError> {
        Ok(query::latest_status(&self.get(patient_id).await?))
    }

    pub async fn history(&self, patient_id: &str) -> Result<Vec<HeartRate>, CoreError> {
        Ok(query::history(&self.get(patient_id).await?))
    }

    pub async fn average(&self, patient_id: &str) -> Result<f64, CoreError> {
        query::average(&self.get(patient_id).await?)
    }

    pub async fn interval_average(
        &self,
        patient_id: &str,
        since: &Timestamp,
    ) -> Result<f64, CoreError> {
        query::interval_average(&self.get(patient_id).await?, since)
    }

    /// Wait up to `grace` for in-flight notification deliveries.
    pub async fn drain_notifications(&self, grace: Duration) -> bool {
        self.gate.drain(grace).await
    }

    pub async fn health_check(&self) -> Result<(), CoreError> {
        self.store.health_check().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
