use crate::types::PatientId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duplicate key: {entity} with id {id} already exists")]
    DuplicateKey { entity: &'static str, id: PatientId },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: PatientId },

    #[error("No heart rate readings to aggregate for patient {patient_id}")]
    EmptySeries { patient_id: PatientId },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn patient_not_found(id: impl Into<PatientId>) -> Self {
        CoreError::NotFound {
            entity: "patient",
            id: id.into(),
        }
    }

    pub fn duplicate_patient(id: impl Into<PatientId>) -> Self {
        CoreError::DuplicateKey {
            entity: "patient",
            id: id.into(),
        }
    }
}
