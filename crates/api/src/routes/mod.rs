pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::patient;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// POST   /new_patient                      register a patient
/// POST   /heart_rate                       submit a reading (timestamped now)
/// POST   /heart_rate/interval_average      mean of readings at or before a timestamp
/// GET    /heart_rate/{patient_id}          heart rate history
/// GET    /heart_rate/average/{patient_id}  mean of all readings
/// GET    /status/{patient_id}              latest tachycardia status
/// GET    /all_patients                     every patient keyed by id
/// GET    /patients/{patient_id}            one patient
/// DELETE /patients/{patient_id}            remove a patient
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/new_patient", post(patient::create_patient))
        .route("/heart_rate", post(patient::post_heart_rate))
        .route(
            "/heart_rate/interval_average",
            post(patient::post_interval_average),
        )
        .route("/heart_rate/{patient_id}", get(patient::get_heart_rates))
        .route(
            "/heart_rate/average/{patient_id}",
            get(patient::get_average),
        )
        .route("/status/{patient_id}", get(patient::get_status))
        .route("/all_patients", get(patient::list_patients))
        .route(
            "/patients/{patient_id}",
            get(patient::get_patient).delete(patient::delete_patient),
        )
}
