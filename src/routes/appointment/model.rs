use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::doctor::Doctor;
use crate::routes::patient::Patient;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub clinic_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub date: DateTime<Utc>,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
}

/// 医生和患者都必须属于预约所在的诊所
pub fn ensure_same_clinic(
    clinic_id: Uuid,
    doctor_clinic_id: Uuid,
    patient_clinic_id: Uuid,
) -> Result<(), AppError> {
    if doctor_clinic_id != clinic_id {
        return Err(AppError::Validation(
            "doctor does not belong to this clinic".into(),
        ));
    }
    if patient_clinic_id != clinic_id {
        return Err(AppError::Validation(
            "patient does not belong to this clinic".into(),
        ));
    }
    Ok(())
}

impl Appointment {
    pub async fn create(
        pool: &PgPool,
        clinic_id: Uuid,
        req: CreateAppointmentRequest,
    ) -> Result<Self, AppError> {
        let mut tx = pool.begin().await?;

        let doctor = Doctor::find_by_id(&mut *tx, req.doctor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("doctor not found".into()))?;
        let patient = Patient::find_by_id(&mut *tx, req.patient_id)
            .await?
            .ok_or_else(|| AppError::NotFound("patient not found".into()))?;

        ensure_same_clinic(clinic_id, doctor.clinic_id, patient.clinic_id)?;

        if !doctor.availability().covers(req.date) {
            return Err(AppError::Validation(
                "doctor is not available at this time".into(),
            ));
        }

        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (date, clinic_id, patient_id, doctor_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, date, clinic_id, patient_id, doctor_id, created_at, updated_at
            "#,
        )
        .bind(req.date)
        .bind(clinic_id)
        .bind(patient.id)
        .bind(doctor.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(appointment)
    }

    pub async fn list_by_clinic(pool: &PgPool, clinic_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, date, clinic_id, patient_id, doctor_id, created_at, updated_at
            FROM appointments
            WHERE clinic_id = $1
            ORDER BY date
            "#,
        )
        .bind(clinic_id)
        .fetch_all(pool)
        .await
    }
}
