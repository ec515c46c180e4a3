use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;

use crate::config::Config;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 创建连接池，每个连接都带上应用名便于在 pg_stat_activity 中识别
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'clinic_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT_SQL: &str = include_str!("../../migrations/20250601000000_init.sql");

    fn foreign_key_line(table: &str, column: &str) -> String {
        let start = INIT_SQL
            .find(&format!("CREATE TABLE {} (", table))
            .unwrap_or_else(|| panic!("table {} missing", table));
        INIT_SQL[start..]
            .lines()
            .find(|line| line.trim_start().starts_with(&format!("{} ", column)))
            .unwrap_or_else(|| panic!("column {}.{} missing", table, column))
            .to_string()
    }

    #[test]
    fn clinic_owned_rows_cascade() {
        for (table, column) in [
            ("users_to_clinics", "clinic_id"),
            ("doctors", "clinic_id"),
            ("patients", "clinic_id"),
            ("appointments", "clinic_id"),
            ("appointments", "patient_id"),
            ("appointments", "doctor_id"),
            ("sessions", "user_id"),
            ("accounts", "user_id"),
        ] {
            let line = foreign_key_line(table, column);
            assert!(line.contains("REFERENCES"), "{}.{}", table, column);
            assert!(line.contains("ON DELETE CASCADE"), "{}.{}", table, column);
        }
    }

    #[test]
    fn membership_does_not_cascade_from_users() {
        let line = foreign_key_line("users_to_clinics", "user_id");
        assert!(line.contains("REFERENCES users (id)"));
        assert!(!line.contains("CASCADE"));
    }

    #[test]
    fn membership_key_is_the_pair() {
        assert!(INIT_SQL.contains("PRIMARY KEY (user_id, clinic_id)"));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a live postgres via DATABASE_URL"]
    async fn deleting_a_clinic_removes_its_rows(pool: PgPool) -> sqlx::Result<()> {
        use crate::routes::clinic::Clinic;

        sqlx::query("INSERT INTO users (id, name, email) VALUES ('u1', 'Ana', 'ana@clinic.com')")
            .execute(&pool)
            .await?;
        let clinic = Clinic::create_for_user(&pool, "u1", "Clínica Vida").await?;

        sqlx::query(
            r#"
            WITH d AS (
                INSERT INTO doctors (
                    clinic_id, name, available_from_week_day, available_to_week_day,
                    available_from_time, available_to_time, specialty, appointment_price_in_cents
                )
                VALUES ($1, 'Dr. Paulo', 1, 5, '08:00', '18:00', 'Cardiology', 15000)
                RETURNING id
            ), p AS (
                INSERT INTO patients (clinic_id, name, email, phone_number, sex)
                VALUES ($1, 'João', 'joao@mail.com', '11999990000', 'male')
                RETURNING id
            )
            INSERT INTO appointments (date, clinic_id, patient_id, doctor_id)
            SELECT NOW(), $1, p.id, d.id FROM d, p
            "#,
        )
        .bind(clinic.id)
        .execute(&pool)
        .await?;

        assert!(Clinic::delete(&pool, clinic.id).await?);

        for table in ["doctors", "patients", "appointments", "users_to_clinics"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await?;
            assert_eq!(count, 0, "{} should be empty", table);
        }

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await?;
        assert_eq!(users, 1);

        Ok(())
    }
}
