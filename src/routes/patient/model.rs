use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "patient_sex", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PatientSex {
    Male,
    Female,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub sex: PatientSex,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1), custom = "crate::utils::not_blank")]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1), custom = "crate::utils::not_blank")]
    pub phone_number: String,
    pub sex: PatientSex,
}

impl Patient {
    pub async fn create(
        pool: &PgPool,
        clinic_id: Uuid,
        req: CreatePatientRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (clinic_id, name, email, phone_number, sex)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, clinic_id, name, email, phone_number, sex, created_at, updated_at
            "#,
        )
        .bind(clinic_id)
        .bind(req.name.trim())
        .bind(req.email.trim())
        .bind(req.phone_number.trim())
        .bind(req.sex)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_clinic(pool: &PgPool, clinic_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, clinic_id, name, email, phone_number, sex, created_at, updated_at
            FROM patients
            WHERE clinic_id = $1
            ORDER BY name
            "#,
        )
        .bind(clinic_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        patient_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Patient>(
            r#"
            SELECT id, clinic_id, name, email, phone_number, sex, created_at, updated_at
            FROM patients
            WHERE id = $1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(executor)
        .await
    }
}
