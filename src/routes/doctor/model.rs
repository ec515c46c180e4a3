use chrono::{DateTime, Datelike, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Doctor {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub avatar_image_url: Option<String>,
    pub available_from_week_day: i32,
    pub available_to_week_day: i32,
    pub available_from_time: NaiveTime,
    pub available_to_time: NaiveTime,
    pub specialty: String,
    pub appointment_price_in_cents: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDoctorRequest {
    #[validate(length(min = 1), custom = "crate::utils::not_blank")]
    pub name: String,
    #[validate(url(message = "invalid avatar url"))]
    pub avatar_image_url: Option<String>,
    #[validate(range(min = 0, max = 6, message = "must be between 0 and 6"))]
    pub available_from_week_day: i32,
    #[validate(range(min = 0, max = 6, message = "must be between 0 and 6"))]
    pub available_to_week_day: i32,
    pub available_from_time: NaiveTime,
    pub available_to_time: NaiveTime,
    #[validate(length(min = 1), custom = "crate::utils::not_blank")]
    pub specialty: String,
    #[validate(range(min = 0, message = "cannot be negative"))]
    pub appointment_price_in_cents: i32,
}

/// 每周可预约时段。0 = 周日 .. 6 = 周六；起点大于终点时回绕，
/// 如 5..1 为周五到周一，22:00..06:00 跨越午夜。
/// 开始时间包含、结束时间不包含，二者相等表示全天。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub from_week_day: u32,
    pub to_week_day: u32,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
}

impl Availability {
    pub fn covers_week_day(&self, day: u32) -> bool {
        if self.from_week_day <= self.to_week_day {
            (self.from_week_day..=self.to_week_day).contains(&day)
        } else {
            day >= self.from_week_day || day <= self.to_week_day
        }
    }

    pub fn covers_time(&self, time: NaiveTime) -> bool {
        if self.from_time < self.to_time {
            time >= self.from_time && time < self.to_time
        } else if self.from_time > self.to_time {
            time >= self.from_time || time < self.to_time
        } else {
            true
        }
    }

    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.covers_week_day(at.weekday().num_days_from_sunday()) && self.covers_time(at.time())
    }
}

/// 已通过范围校验的星期值
fn week_day(value: i32) -> u32 {
    value.clamp(0, 6) as u32
}

impl CreateDoctorRequest {
    /// 校验请求并得到可预约时段
    pub fn availability(&self) -> Result<Availability, AppError> {
        self.validate()?;

        Ok(Availability {
            from_week_day: week_day(self.available_from_week_day),
            to_week_day: week_day(self.available_to_week_day),
            from_time: self.available_from_time,
            to_time: self.available_to_time,
        })
    }
}

impl Doctor {
    pub fn availability(&self) -> Availability {
        Availability {
            from_week_day: week_day(self.available_from_week_day),
            to_week_day: week_day(self.available_to_week_day),
            from_time: self.available_from_time,
            to_time: self.available_to_time,
        }
    }

    pub async fn create(
        pool: &PgPool,
        clinic_id: Uuid,
        req: CreateDoctorRequest,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Doctor>(
            r#"
            INSERT INTO doctors (
                clinic_id, name, avatar_image_url,
                available_from_week_day, available_to_week_day,
                available_from_time, available_to_time,
                specialty, appointment_price_in_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, clinic_id, name, avatar_image_url,
                available_from_week_day, available_to_week_day,
                available_from_time, available_to_time,
                specialty, appointment_price_in_cents, created_at, updated_at
            "#,
        )
        .bind(clinic_id)
        .bind(req.name.trim())
        .bind(req.avatar_image_url)
        .bind(req.available_from_week_day)
        .bind(req.available_to_week_day)
        .bind(req.available_from_time)
        .bind(req.available_to_time)
        .bind(req.specialty.trim())
        .bind(req.appointment_price_in_cents)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_clinic(pool: &PgPool, clinic_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Doctor>(
            r#"
            SELECT
                id, clinic_id, name, avatar_image_url,
                available_from_week_day, available_to_week_day,
                available_from_time, available_to_time,
                specialty, appointment_price_in_cents, created_at, updated_at
            FROM doctors
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
        doctor_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Doctor>(
            r#"
            SELECT
                id, clinic_id, name, avatar_image_url,
                available_from_week_day, available_to_week_day,
                available_from_time, available_to_time,
                specialty, appointment_price_in_cents, created_at, updated_at
            FROM doctors
            WHERE id = $1
            "#,
        )
        .bind(doctor_id)
        .fetch_optional(executor)
        .await
    }
}
