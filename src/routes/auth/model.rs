use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::access::{ClientInfo, Session, SessionUser};

pub const CREDENTIAL_PROVIDER: &str = "credential";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
        }
    }
}

impl User {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        name: &str,
        email: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, email_verified, image, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_email<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, email_verified, image, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await
    }
}

/// 用户的登录方式；密码登录使用 `credential`，`password` 存 bcrypt 哈希
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub account_id: String,
    pub provider_id: String,
    pub user_id: String,
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub async fn create_credential<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: &str,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, account_id, provider_id, user_id, password)
            VALUES ($1, $2, $3, $2, $4)
            RETURNING id, account_id, provider_id, user_id, password, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(CREDENTIAL_PROVIDER)
        .bind(password_hash)
        .fetch_one(executor)
        .await
    }

    pub async fn find_credential<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, account_id, provider_id, user_id, password, created_at, updated_at
            FROM accounts
            WHERE user_id = $1 AND provider_id = $2
            "#,
        )
        .bind(user_id)
        .bind(CREDENTIAL_PROVIDER)
        .fetch_optional(executor)
        .await
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub expires_at: DateTime<Utc>,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: String,
}

/// 未过期会话及其用户
#[derive(Debug, Clone, FromRow)]
pub struct ActiveSession {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl From<ActiveSession> for Session {
    fn from(row: ActiveSession) -> Self {
        Self {
            id: row.session_id,
            expires_at: row.expires_at,
            user: SessionUser {
                id: row.user_id,
                name: row.name,
                email: row.email,
                image: row.image,
            },
        }
    }
}

impl SessionRecord {
    /// `token_hash` 是 cookie 值的摘要，不是原始 token
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        client: &ClientInfo,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4().to_string();

        sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO sessions (id, expires_at, token, ip_address, user_agent, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, expires_at, token, created_at, updated_at, ip_address, user_agent, user_id
            "#,
        )
        .bind(id)
        .bind(expires_at)
        .bind(token_hash)
        .bind(client.ip_address.as_deref())
        .bind(client.user_agent.as_deref())
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_active<'e, E: PgExecutor<'e>>(
        executor: E,
        token_hash: &str,
    ) -> Result<Option<ActiveSession>, sqlx::Error> {
        sqlx::query_as::<_, ActiveSession>(
            r#"
            SELECT
                s.id AS session_id,
                s.expires_at,
                u.id AS user_id,
                u.name,
                u.email,
                u.image
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete_by_token<'e, E: PgExecutor<'e>>(
        executor: E,
        token_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token_hash)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// 删除过期会话，返回删除条数
    pub async fn purge_expired<'e, E: PgExecutor<'e>>(executor: E) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
