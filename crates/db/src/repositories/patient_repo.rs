//! Repository for the `patients` table.

use sqlx::{PgConnection, PgPool};

use crate::models::PatientRow;

/// Column list for `patients` queries.
const COLUMNS: &str = "patient_id, attending_email, user_age";

/// Provides query operations for patients.
pub struct PatientRepo;

impl PatientRepo {
    /// Insert a new patient. A duplicate id fails with a unique violation
    /// (SQLSTATE 23505) on the primary key.
    pub async fn create(
        pool: &PgPool,
        patient_id: &str,
        attending_email: &str,
        user_age: i32,
    ) -> Result<PatientRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO patients (patient_id, attending_email, user_age) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(patient_id)
            .bind(attending_email)
            .bind(user_age)
            .fetch_one(pool)
            .await
    }

    /// Find a patient by id.
    pub async fn find_by_id(
        pool: &PgPool,
        patient_id: &str,
    ) -> Result<Option<PatientRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients WHERE patient_id = $1");
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(patient_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a patient by id and lock its row until the transaction ends.
    ///
    /// Serializes appends for one patient and blocks a concurrent delete.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        patient_id: &str,
    ) -> Result<Option<PatientRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients WHERE patient_id = $1 FOR UPDATE");
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(patient_id)
            .fetch_optional(conn)
            .await
    }

    /// Find a patient by id and hold a share lock until the transaction ends.
    ///
    /// Blocks a concurrent delete but not other readers.
    pub async fn find_for_share(
        conn: &mut PgConnection,
        patient_id: &str,
    ) -> Result<Option<PatientRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients WHERE patient_id = $1 FOR SHARE");
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(patient_id)
            .fetch_optional(conn)
            .await
    }

    /// List every patient ordered by id.
    pub async fn list(pool: &PgPool) -> Result<Vec<PatientRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients ORDER BY patient_id");
        sqlx::query_as::<_, PatientRow>(&query).fetch_all(pool).await
    }

    /// Delete a patient; readings go with it via `ON DELETE CASCADE`.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, patient_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM patients WHERE patient_id = $1")
            .bind(patient_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
