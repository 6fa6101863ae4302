//! Handlers for patient registration, heart rate submission and queries.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use sentinel_core::patient::{IntervalAverageDraft, Patient, PatientDraft, ReadingDraft};
use sentinel_core::query::LatestStatus;
use sentinel_core::types::{HeartRate, PatientId};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response body for the delete endpoint.
#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

/// POST /api/new_patient
///
/// Register a patient with an empty reading history.
pub async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<PatientDraft>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<Patient>>)> {
    let Json(draft) = payload?;
    let patient = state.service.register(draft.validate()?).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: patient })))
}

/// POST /api/heart_rate
///
/// Append a reading stamped with the server clock. A tachycardia
/// notification, if any, is delivered in the background.
pub async fn post_heart_rate(
    State(state): State<AppState>,
    payload: Result<Json<ReadingDraft>, JsonRejection>,
) -> AppResult<Json<DataResponse<Patient>>> {
    let Json(draft) = payload?;
    let (patient_id, heart_rate) = draft.validate()?;
    let appended = state
        .service
        .record_heart_rate(&patient_id, heart_rate)
        .await?;
    Ok(Json(DataResponse {
        data: appended.patient,
    }))
}

/// GET /api/status/{patient_id}
///
/// Tachycardia status of the latest reading; both fields are `null` when the
/// patient has no readings.
pub async fn get_status(
    State(state): State<AppState>,
    Path(patient_id): Path<PatientId>,
) -> AppResult<Json<DataResponse<LatestStatus>>> {
    let status = state.service.latest_status(&patient_id).await?;
    Ok(Json(DataResponse { data: status }))
}

/// GET /api/heart_rate/{patient_id}
pub async fn get_heart_rates(
    State(state): State<AppState>,
    Path(patient_id): Path<PatientId>,
) -> AppResult<Json<DataResponse<Vec<HeartRate>>>> {
    let history = state.service.history(&patient_id).await?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /api/heart_rate/average/{patient_id}
///
/// Returns 204 when the patient has no readings.
pub async fn get_average(
    State(state): State<AppState>,
    Path(patient_id): Path<PatientId>,
) -> AppResult<Json<DataResponse<f64>>> {
    let average = state.service.average(&patient_id).await?;
    Ok(Json(DataResponse { data: average }))
}

/// POST /api/heart_rate/interval_average
///
/// Mean of the readings recorded at or before `heart_rate_average_since`.
/// Returns 204 when no reading qualifies.
pub async fn post_interval_average(
    State(state): State<AppState>,
    payload: Result<Json<IntervalAverageDraft>, JsonRejection>,
) -> AppResult<Json<DataResponse<f64>>> {
    let Json(draft) = payload?;
    let (patient_id, since) = draft.validate()?;
    let average = state.service.interval_average(&patient_id, &since).await?;
    Ok(Json(DataResponse { data: average }))
}

/// GET /api/all_patients
pub async fn list_patients(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<BTreeMap<PatientId, Patient>>>> {
    let patients = state.service.list_all().await?;
    Ok(Json(DataResponse { data: patients }))
}

/// GET /api/patients/{patient_id}
pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<PatientId>,
) -> AppResult<Json<DataResponse<Patient>>> {
    let patient = state.service.get(&patient_id).await?;
    Ok(Json(DataResponse { data: patient }))
}

/// DELETE /api/patients/{patient_id}
pub async fn delete_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<PatientId>,
) -> AppResult<Json<DataResponse<RemovedResponse>>> {
    let removed = state.service.remove(&patient_id).await?;
    Ok(Json(DataResponse {
        data: RemovedResponse { removed },
    }))
}
