//! Derived queries over a single patient's reading series.
//!
//! Pure logic: callers fetch the patient snapshot from a store and pass it
//! in. Aggregates over zero readings fail with [`CoreError::EmptySeries`]
//! rather than dividing by zero.

use serde::Serialize;

use crate::classifier::is_tachycardic;
use crate::error::CoreError;
use crate::patient::{Patient, Reading};
use crate::types::{HeartRate, Timestamp};

/// Classification of the most recent reading.
///
/// Both fields are `None` when the patient has no readings yet; that is a
/// defined "no data" answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestStatus {
    pub is_tachycardic: Option<bool>,
    pub timestamp: Option<Timestamp>,
}

impl LatestStatus {
    pub fn no_data() -> Self {
        Self {
            is_tachycardic: None,
            timestamp: None,
        }
    }
}

pub fn latest_status(patient: &Patient) -> LatestStatus {
    match patient.latest() {
        Some(reading) => LatestStatus {
            is_tachycardic: Some(is_tachycardic(patient.user_age, reading.heart_rate)),
            timestamp: Some(reading.timestamp.clone()),
        },
        None => LatestStatus::no_data(),
    }
}

/// Every heart rate in insertion order.
pub fn history(patient: &Patient) -> Vec<HeartRate> {
    patient.readings.iter().map(|r| r.heart_rate).collect()
}

/// Arithmetic mean of all heart rates.
pub fn average(patient: &Patient) -> Result<f64, CoreError> {
    mean(patient.readings.iter()).ok_or_else(|| empty(patient))
}

/// Mean of the heart rates recorded at or before `since` (inclusive).
pub fn interval_average(patient: &Patient, since: &Timestamp) -> Result<f64, CoreError> {
    mean(patient.readings.iter().filter(|r| r.timestamp <= *since)).ok_or_else(|| empty(patient))
}

fn mean<'a>(readings: impl Iterator<Item = &'a Reading>) -> Option<f64> {
    let (sum, count) = readings.fold((0u64, 0u64), |(sum, count), r| {
        (sum + u64::from(r.heart_rate), count + 1)
    });
    (count > 0).then(|| sum as f64 / count as f64)
}

fn empty(patient: &Patient) -> CoreError {
    CoreError::EmptySeries {
        patient_id: patient.patient_id.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
