//! Row structs for the `patients` and `heart_rate_readings` tables.

use sentinel_core::error::CoreError;
use sentinel_core::patient::{Patient, Reading};
use sentinel_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row of the `patients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PatientRow {
    pub patient_id: String,
    pub attending_email: String,
    pub user_age: i32,
}

/// A row of the `heart_rate_readings` table (append-only).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReadingRow {
    pub id: i64,
    pub patient_id: String,
    pub heart_rate: i32,
    pub recorded_at: String,
}

impl ReadingRow {
    pub fn into_reading(self) -> Result<Reading, CoreError> {
        let heart_rate = u32::try_from(self.heart_rate).map_err(|_| {
            CoreError::Internal(format!("stored heart rate {} is negative", self.heart_rate))
        })?;
        Ok(Reading {
            heart_rate,
            timestamp: Timestamp::parse(&self.recorded_at)?,
        })
    }
}

impl PatientRow {
    /// Assemble the domain patient from its row and its readings, which
    /// must already be in insertion (`id`) order.
    pub fn into_patient(self, readings: Vec<ReadingRow>) -> Result<Patient, CoreError> {
        let user_age = u32::try_from(self.user_age).map_err(|_| {
            CoreError::Internal(format!("stored age {} is negative", self.user_age))
        })?;
        let readings = readings
            .into_iter()
            .map(ReadingRow::into_reading)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Patient {
            patient_id: self.patient_id,
            attending_email: self.attending_email,
            user_age,
            readings,
        })
    }
}
