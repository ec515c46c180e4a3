use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use sqlx::{PgExecutor, PgPool};

use super::{
    ClientInfo, CredentialProvider, IssuedSession, MembershipStore, Session, SessionProvider,
};
use crate::config::MAX_SESSION_HOURS;
use crate::error::AppError;
use crate::forms::{LoginInput, SignUpInput};
use crate::routes::auth::{Account, SessionRecord, User};
use crate::routes::clinic::Membership;
use crate::utils::{
    generate_session_token, hash_password, hash_session_token, session_token_from_headers,
    verify_password,
};

/// 邮箱密码凭证与 cookie 会话，存储在 Postgres
#[derive(Clone)]
pub struct PgAuthProvider {
    pool: PgPool,
    session_ttl: chrono::Duration,
}

/// 转换为 chrono 时长，不超过配置允许的上限
fn bounded_ttl(ttl: std::time::Duration) -> chrono::Duration {
    let max = chrono::Duration::hours(MAX_SESSION_HOURS as i64);
    chrono::Duration::from_std(ttl).map_or(max, |ttl| ttl.min(max))
}

impl PgAuthProvider {
    pub fn new(pool: PgPool, session_ttl: std::time::Duration) -> Self {
        Self {
            pool,
            session_ttl: bounded_ttl(session_ttl),
        }
    }

    async fn issue_session<'e, E: PgExecutor<'e>>(
        &self,
        executor: E,
        user: User,
        client: &ClientInfo,
    ) -> Result<IssuedSession, AppError> {
        let token = generate_session_token();
        let expires_at = Utc::now()
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| AppError::Internal("session expiry out of range".into()))?;

        SessionRecord::create(
            executor,
            &user.id,
            &hash_session_token(&token),
            expires_at,
            client,
        )
        .await?;

        Ok(IssuedSession {
            token,
            expires_at,
            user: user.into(),
        })
    }
}

#[async_trait]
impl SessionProvider for PgAuthProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, AppError> {
        let Some(token) = session_token_from_headers(headers) else {
            return Ok(None);
        };

        let session = SessionRecord::find_active(&self.pool, &hash_session_token(&token)).await?;
        Ok(session.map(Session::from))
    }

    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let token = session_token_from_headers(headers).ok_or(AppError::Unauthorized)?;

        let removed = SessionRecord::delete_by_token(&self.pool, &hash_session_token(&token)).await?;
        if removed == 0 {
            tracing::debug!("Sign-out for a session that no longer exists");
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for PgAuthProvider {
    async fn sign_up_email(
        &self,
        input: SignUpInput,
        client: ClientInfo,
    ) -> Result<IssuedSession, AppError> {
        let email = input.email.to_lowercase();
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        // 用户、账号、会话在同一事务中创建
        let mut tx = self.pool.begin().await?;

        let user = User::create(&mut *tx, &input.name, &email)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("email already registered".into())
                }
                e => AppError::Database(e),
            })?;

        Account::create_credential(&mut *tx, &user.id, &password_hash).await?;
        let issued = self.issue_session(&mut *tx, user, &client).await?;

        tx.commit().await?;

        tracing::info!("Created user {}", issued.user.id);
        Ok(issued)
    }

    async fn sign_in_email(
        &self,
        input: LoginInput,
        client: ClientInfo,
    ) -> Result<IssuedSession, AppError> {
        let email = input.email.to_lowercase();

        let user = User::find_by_email(&self.pool, &email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let password_hash = Account::find_credential(&self.pool, &user.id)
            .await?
            .and_then(|account| account.password)
            .ok_or(AppError::Unauthorized)?;

        let password = input.password;
        let valid =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await??;
        if !valid {
            return Err(AppError::Unauthorized);
        }

        self.issue_session(&self.pool, user, &client).await
    }
}

#[derive(Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn find_memberships(&self, user_id: &str) -> Result<Vec<Membership>, AppError> {
        Ok(Membership::find_by_user(&self.pool, user_id).await?)
    }
}
