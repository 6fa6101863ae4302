//! Patient and reading models, plus boundary validation of raw payloads.
//!
//! Request bodies arrive as loosely typed JSON. The `*Draft` structs keep
//! every field as `Option<serde_json::Value>` so that an absent field
//! ([`CoreError::MissingField`]) can be told apart from a present field of
//! the wrong type or range ([`CoreError::InvalidArgument`]). Validation
//! happens once, here; everything past this module works with typed values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::types::{HeartRate, PatientId, Timestamp};

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// One `(heart_rate, timestamp)` observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub heart_rate: HeartRate,
    pub timestamp: Timestamp,
}

/// A monitored patient and its append-only reading series.
///
/// `readings` is kept in insertion order, which is the canonical sequence
/// order even if wall-clock timestamps arrive out of order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: PatientId,
    pub attending_email: String,
    pub user_age: u32,
    pub readings: Vec<Reading>,
}

impl Patient {
    /// Build a patient with an empty series from validated registration data.
    pub fn from_new(new: NewPatient) -> Self {
        Self {
            patient_id: new.patient_id,
            attending_email: new.attending_email,
            user_age: new.user_age,
            readings: Vec::new(),
        }
    }

    /// The most recently appended reading, if any.
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }
}

/// Validated registration data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub patient_id: PatientId,
    pub attending_email: String,
    pub user_age: u32,
}

impl NewPatient {
    /// Validate typed registration input.
    pub fn new(
        patient_id: impl Into<String>,
        attending_email: impl Into<String>,
        user_age: u32,
    ) -> Result<Self, CoreError> {
        let patient_id = validate_patient_id_str(patient_id.into())?;
        let attending_email = validate_email(attending_email.into())?;
        Ok(Self {
            patient_id,
            attending_email,
            user_age,
        })
    }
}

// ---------------------------------------------------------------------------
// Drafts (raw request payloads)
// ---------------------------------------------------------------------------

/// Raw body of a "create patient" request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PatientDraft {
    pub patient_id: Option<Value>,
    pub attending_email: Option<Value>,
    pub user_age: Option<Value>,
}

impl PatientDraft {
    pub fn validate(self) -> Result<NewPatient, CoreError> {
        let patient_id = parse_patient_id(self.patient_id)?;
        let attending_email = match required(self.attending_email, "attending_email")? {
            Value::String(s) => validate_email(s)?,
            other => {
                return Err(CoreError::InvalidArgument(format!(
                    "attending_email must be a string, got {other}"
                )))
            }
        };
        let user_age = parse_non_negative_int(self.user_age, "user_age")?;
        Ok(NewPatient {
            patient_id,
            attending_email,
            user_age,
        })
    }
}

/// Raw body of a "submit reading" request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReadingDraft {
    pub patient_id: Option<Value>,
    pub heart_rate: Option<Value>,
}

impl ReadingDraft {
    pub fn validate(self) -> Result<(PatientId, HeartRate), CoreError> {
        let patient_id = parse_patient_id(self.patient_id)?;
        let heart_rate = parse_non_negative_int(self.heart_rate, "heart_rate")?;
        Ok((patient_id, heart_rate))
    }
}

/// Raw body of an "interval average" request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IntervalAverageDraft {
    pub patient_id: Option<Value>,
    pub heart_rate_average_since: Option<Value>,
}

impl IntervalAverageDraft {
    pub fn validate(self) -> Result<(PatientId, Timestamp), CoreError> {
        let patient_id = parse_patient_id(self.patient_id)?;
        let since = match required(self.heart_rate_average_since, "heart_rate_average_since")? {
            Value::String(s) => Timestamp::parse(&s)?,
            other => {
                return Err(CoreError::InvalidArgument(format!(
                    "heart_rate_average_since must be a timestamp string, got {other}"
                )))
            }
        };
        Ok((patient_id, since))
    }
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

fn required(value: Option<Value>, field: &'static str) -> Result<Value, CoreError> {
    value.ok_or(CoreError::MissingField(field))
}

/// Accepts a JSON string or integer and normalizes it to a string id.
fn parse_patient_id(value: Option<Value>) -> Result<PatientId, CoreError> {
    match required(value, "patient_id")? {
        Value::String(s) => validate_patient_id_str(s),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(CoreError::InvalidArgument(format!(
            "patient_id must be a string or integer, got {other}"
        ))),
    }
}

fn validate_patient_id_str(id: String) -> Result<PatientId, CoreError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidArgument(
            "patient_id must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn parse_non_negative_int(value: Option<Value>, field: &'static str) -> Result<u32, CoreError> {
    let value = required(value, field)?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            CoreError::InvalidArgument(format!("{field} must be a non-negative integer, got {value}"))
        })
}

/// Contact addresses must be syntactically valid and carry a dotted domain.
fn validate_email(email: String) -> Result<String, CoreError> {
    let email = email.trim().to_string();
    if !email.validate_email() || !email.contains('.') {
        return Err(CoreError::InvalidArgument(format!(
            "attending_email '{email}' is not a valid email address"
        )));
    }
    Ok(email)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn draft(body: Value) -> PatientDraft {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn valid_patient_draft() {
        let new = draft(json!({
            "patient_id": "ABC",
            "attending_email": "doc@duke.edu",
            "user_age": 21,
        }))
        .validate()
        .unwrap();
        assert_eq!(new.patient_id, "ABC");
        assert_eq!(new.attending_email, "doc@duke.edu");
        assert_eq!(new.user_age, 21);
    }

    #[test]
    fn numeric_patient_id_is_normalized() {
        let new = draft(json!({
            "patient_id": 42,
            "attending_email": "doc@duke.edu",
            "user_age": 3,
        }))
        .validate()
        .unwrap();
        assert_eq!(new.patient_id, "42");
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let err = draft(json!({ "attending_email": "doc@duke.edu", "user_age": 3 }))
            .validate()
            .unwrap_err();
        assert_matches!(err, CoreError::MissingField("patient_id"));

        let err = draft(json!({ "patient_id": "A", "user_age": 3 }))
            .validate()
            .unwrap_err();
        assert_matches!(err, CoreError::MissingField("attending_email"));

        let err = draft(json!({ "patient_id": "A", "attending_email": "doc@duke.edu", "user_age": null }))
            .validate()
            .unwrap_err();
        assert_matches!(err, CoreError::MissingField("user_age"));
    }

    #[test]
    fn negative_or_fractional_age_is_invalid() {
        for age in [json!(-1), json!(21.5), json!("21"), json!(true)] {
            let err = draft(json!({
                "patient_id": "A",
                "attending_email": "doc@duke.edu",
                "user_age": age,
            }))
            .validate()
            .unwrap_err();
            assert_matches!(err, CoreError::InvalidArgument(_));
        }
    }

    #[test]
    fn email_needs_at_and_dot() {
        for email in ["doc.duke.edu", "doc@localhost", "", "@"] {
            let err = NewPatient::new("A", email, 30).unwrap_err();
            assert_matches!(err, CoreError::InvalidArgument(_));
        }
        assert!(NewPatient::new("A", "szx2@duke.edu", 30).is_ok());
    }

    #[test]
    fn blank_patient_id_is_invalid() {
        assert_matches!(
            NewPatient::new("   ", "doc@duke.edu", 30),
            Err(CoreError::InvalidArgument(_))
        );
    }

    #[test]
    fn reading_draft_rejects_negative_heart_rate() {
        let d: ReadingDraft =
            serde_json::from_value(json!({ "patient_id": "A", "heart_rate": -5 })).unwrap();
        assert_matches!(d.validate(), Err(CoreError::InvalidArgument(_)));

        let d: ReadingDraft =
            serde_json::from_value(json!({ "patient_id": "A", "heart_rate": 72.4 })).unwrap();
        assert_matches!(d.validate(), Err(CoreError::InvalidArgument(_)));

        let d: ReadingDraft = serde_json::from_value(json!({ "patient_id": "A" })).unwrap();
        assert_matches!(d.validate(), Err(CoreError::MissingField("heart_rate")));
    }

    #[test]
    fn interval_draft_parses_timestamp() {
        let d: IntervalAverageDraft = serde_json::from_value(json!({
            "patient_id": "A",
            "heart_rate_average_since": "2018-11-16 10:31:05.123456",
        }))
        .unwrap();
        let (id, since) = d.validate().unwrap();
        assert_eq!(id, "A");
        assert_eq!(since.as_str(), "2018-11-16T10:31:05.123456");
    }

    #[test]
    fn interval_draft_rejects_bad_timestamp() {
        let d: IntervalAverageDraft = serde_json::from_value(json!({
            "patient_id": "A",
            "heart_rate_average_since": 12,
        }))
        .unwrap();
        assert_matches!(d.validate(), Err(CoreError::InvalidArgument(_)));
    }
}
