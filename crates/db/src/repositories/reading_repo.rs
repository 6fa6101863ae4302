//! Repository for the `heart_rate_readings` table.

use sqlx::{PgConnection, PgPool};

use crate::models::ReadingRow;

/// Column list for `heart_rate_readings` queries.
const COLUMNS: &str = "id, patient_id, heart_rate, recorded_at";

/// Provides query operations for heart rate readings.
pub struct ReadingRepo;

impl ReadingRepo {
    /// Append a reading for a patient.
    pub async fn insert(
        conn: &mut PgConnection,
        patient_id: &str,
        heart_rate: i32,
        recorded_at: &str,
    ) -> Result<ReadingRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO heart_rate_readings (patient_id, heart_rate, recorded_at) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReadingRow>(&query)
            .bind(patient_id)
            .bind(heart_rate)
            .bind(recorded_at)
            .fetch_one(conn)
            .await
    }

    /// All readings of one patient in insertion order.
    pub async fn list_for_patient(
        conn: &mut PgConnection,
        patient_id: &str,
    ) -> Result<Vec<ReadingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM heart_rate_readings \
             WHERE patient_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, ReadingRow>(&query)
            .bind(patient_id)
            .fetch_all(conn)
            .await
    }

    /// Every reading, grouped by patient and in insertion order within each.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<ReadingRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM heart_rate_readings \
             ORDER BY patient_id, id"
        );
        sqlx::query_as::<_, ReadingRow>(&query).fetch_all(pool).await
    }
}
