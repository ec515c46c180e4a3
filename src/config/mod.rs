use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub session_expiration_secs: u64,
    pub session_cookie_secure: bool,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
}

/// 会话有效期上限：一年
pub const MAX_SESSION_HOURS: u64 = 24 * 365;
const SECS_PER_HOUR: u64 = 3600;

/// 小时数转秒，超过上限时截断
fn session_expiration_secs(hours: u64) -> u64 {
    hours
        .min(MAX_SESSION_HOURS)
        .checked_mul(SECS_PER_HOUR)
        .unwrap_or(MAX_SESSION_HOURS * SECS_PER_HOUR)
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        // 会话有效期以小时配置，例如 "24h"
        let session_expiration = env::var("SESSION_EXPIRATION")
            .ok()
            .and_then(|v| parse_hours(&v))
            .unwrap_or(24 * 7);

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            redis_url: env::var("REDIS_URL")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".into()),
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            session_expiration_secs: session_expiration_secs(session_expiration),
            session_cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW")?.parse().unwrap_or(60),
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")?.parse().unwrap_or(100),
        })
    }

    pub fn session_expiration(&self) -> Duration {
        Duration::from_secs(
            self.session_expiration_secs
                .min(MAX_SESSION_HOURS * SECS_PER_HOUR),
        )
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

/// 解析小时数，支持 `"24h"` 或 `"24"`
fn parse_hours(value: &str) -> Option<u64> {
    value.trim().trim_end_matches('h').parse::<u64>().ok()
}
