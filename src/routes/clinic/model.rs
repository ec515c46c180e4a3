use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `users_to_clinics` 行，主键为 `(user_id, clinic_id)`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Membership {
    pub user_id: String,
    pub clinic_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClinicRequest {
    #[validate(length(min = 1), custom = "crate::utils::not_blank")]
    pub name: String,
}

impl CreateClinicRequest {
    /// 校验后返回去掉首尾空白的名称
    pub fn validated_name(&self) -> Result<&str, AppError> {
        self.validate()?;
        Ok(self.name.trim())
    }
}

impl Clinic {
    /// 在同一事务中创建诊所和成员关系
    pub async fn create_for_user(
        pool: &PgPool,
        user_id: &str,
        name: &str,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let clinic = sqlx::query_as::<_, Clinic>(
            r#"
            INSERT INTO clinics (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO users_to_clinics (user_id, clinic_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(clinic.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Created clinic {} for user {}", clinic.id, user_id);
        Ok(clinic)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Clinic>(
            r#"
            SELECT c.id, c.name, c.created_at, c.updated_at
            FROM clinics c
            JOIN users_to_clinics uc ON uc.clinic_id = c.id
            WHERE uc.user_id = $1
            ORDER BY uc.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// 删除诊所，医生、患者、预约和成员关系随外键级联删除
    pub async fn delete(pool: &PgPool, clinic_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clinics WHERE id = $1")
            .bind(clinic_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl Membership {
    pub async fn find_by_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT user_id, clinic_id, created_at, updated_at
            FROM users_to_clinics
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    pub async fn exists<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: &str,
        clinic_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users_to_clinics WHERE user_id = $1 AND clinic_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(clinic_id)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clinic_name_is_trimmed() {
        let req = CreateClinicRequest {
            name: "  Clínica Vida  ".into(),
        };
        assert_eq!(req.validated_name().unwrap(), "Clínica Vida");
    }

    #[test]
    fn blank_clinic_name_is_rejected() {
        let req = CreateClinicRequest { name: "   ".into() };
        assert!(matches!(req.validated_name(), Err(AppError::Validation(_))));

        let req = CreateClinicRequest { name: String::new() };
        let err = req.validated_name().unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
