//! PostgreSQL-backed [`PatientStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use sentinel_core::error::CoreError;
use sentinel_core::patient::{NewPatient, Patient, Reading};
use sentinel_core::store::PatientStore;
use sentinel_core::types::PatientId;

use crate::models::ReadingRow;
use crate::repositories::{PatientRepo, ReadingRepo};
use crate::DbPool;

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Patient store persisted in the `patients` / `heart_rate_readings` tables.
///
/// Cheaply cloneable (the pool is reference counted).
#[derive(Clone)]
pub struct PgPatientStore {
    pool: DbPool,
}

impl PgPatientStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map a storage failure to a sanitized internal error.
fn internal(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(format!("database error: {err}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION))
}

fn to_db_int(value: u32, field: &str) -> Result<i32, CoreError> {
    i32::try_from(value)
        .map_err(|_| CoreError::InvalidArgument(format!("{field} {value} is out of range")))
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn register(&self, new: NewPatient) -> Result<Patient, CoreError> {
        let age = to_db_int(new.user_age, "user_age")?;
        match PatientRepo::create(&self.pool, &new.patient_id, &new.attending_email, age).await {
            Ok(row) => row.into_patient(Vec::new()),
            Err(e) if is_unique_violation(&e) => Err(CoreError::duplicate_patient(new.patient_id)),
            Err(e) => Err(internal(e)),
        }
    }

    async fn append_reading(
        &self,
        patient_id: &str,
        reading: Reading,
    ) -> Result<Patient, CoreError> {
        let heart_rate = to_db_int(reading.heart_rate, "heart_rate")?;
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let row = PatientRepo::find_for_update(&mut *tx, patient_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::patient_not_found(patient_id))?;

        ReadingRepo::insert(&mut *tx, patient_id, heart_rate, reading.timestamp.as_str())
            .await
            .map_err(internal)?;
        let readings = ReadingRepo::list_for_patient(&mut *tx, patient_id)
            .await
            .map_err(internal)?;

        tx.commit().await.map_err(internal)?;
        row.into_patient(readings)
    }

    async fn get(&self, patient_id: &str) -> Result<Patient, CoreError> {
        // The share lock keeps a concurrent remove from landing between the
        // two reads.
        let mut tx = self.pool.begin().await.map_err(internal)?;
        let row = PatientRepo::find_for_share(&mut *tx, patient_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::patient_not_found(patient_id))?;
        let readings = ReadingRepo::list_for_patient(&mut *tx, patient_id)
            .await
            .map_err(internal)?;
        tx.commit().await.map_err(internal)?;
        row.into_patient(readings)
    }

    async fn list_all(&self) -> Result<BTreeMap<PatientId, Patient>, CoreError> {
        let rows = PatientRepo::list(&self.pool).await.map_err(internal)?;
        let mut readings: BTreeMap<String, Vec<ReadingRow>> = BTreeMap::new();
        for reading in ReadingRepo::list_all(&self.pool).await.map_err(internal)? {
            readings
                .entry(reading.patient_id.clone())
                .or_default()
                .push(reading);
        }

        let mut all = BTreeMap::new();
        for row in rows {
            let own = readings.remove(&row.patient_id).unwrap_or_default();
            let patient = row.into_patient(own)?;
            all.insert(patient.patient_id.clone(), patient);
        }
        Ok(all)
    }

    async fn remove(&self, patient_id: &str) -> Result<bool, CoreError> {
        PatientRepo::delete(&self.pool, patient_id)
            .await
            .map_err(internal)
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(internal)
    }
}
