// 受保护页面的访问控制：先查会话，再查诊所成员关系

mod provider;
#[cfg(test)]
pub(crate) mod testing;

pub use provider::{PgAuthProvider, PgMembershipStore};

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::Notification;
use crate::error::AppError;
use crate::forms::{LoginInput, SignUpInput};
use crate::routes::clinic::Membership;
use crate::utils::client_ip;

pub const AUTHENTICATION_PATH: &str = "/authentication";
pub const CLINIC_FORM_PATH: &str = "/clinic-form";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const SIGN_OUT_PATH: &str = "/sign-out";

pub const SIGN_OUT_FAILED: &str = "Could not sign out of your account!";
/// 仪表盘 `notice` 查询参数的取值
pub const SIGN_OUT_FAILED_NOTICE: &str = "sign-out-failed";

/// 退出失败后回到仪表盘的地址
pub fn sign_out_failed_path() -> String {
    format!("{}?notice={}", DASHBOARD_PATH, SIGN_OUT_FAILED_NOTICE)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

/// 新建的会话；token 为 cookie 原值，不落库
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: client_ip(headers),
            user_agent: headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        }
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, AppError>;

    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AppError>;
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn sign_up_email(
        &self,
        input: SignUpInput,
        client: ClientInfo,
    ) -> Result<IssuedSession, AppError>;

    async fn sign_in_email(
        &self,
        input: LoginInput,
        client: ClientInfo,
    ) -> Result<IssuedSession, AppError>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    // 按 user_id 精确匹配
    async fn find_memberships(&self, user_id: &str) -> Result<Vec<Membership>, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub sign_out_action: &'static str,
}

impl From<SessionUser> for DashboardView {
    fn from(user: SessionUser) -> Self {
        Self {
            name: user.name,
            email: user.email,
            image: user.image,
            sign_out_action: SIGN_OUT_PATH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Render(DashboardView),
    Redirect(&'static str),
}

/// 查询会话，提供方出错时按匿名处理
pub async fn resolve_session(
    sessions: &dyn SessionProvider,
    headers: &HeaderMap,
) -> Option<Session> {
    match sessions.get_session(headers).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Session lookup failed, treating request as anonymous: {}", e);
            None
        }
    }
}

pub async fn evaluate(
    sessions: &dyn SessionProvider,
    memberships: &dyn MembershipStore,
    headers: &HeaderMap,
) -> Result<GateOutcome, AppError> {
    let Some(session) = resolve_session(sessions, headers).await else {
        return Ok(GateOutcome::Redirect(AUTHENTICATION_PATH));
    };

    let clinics = memberships.find_memberships(&session.user.id).await?;
    if clinics.is_empty() {
        tracing::debug!("User {} has no clinic yet", session.user.id);
        return Ok(GateOutcome::Redirect(CLINIC_FORM_PATH));
    }

    Ok(GateOutcome::Render(DashboardView::from(session.user)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutOutcome {
    Navigate(&'static str),
    Notify(Notification),
}

pub async fn sign_out(sessions: &dyn SessionProvider, headers: &HeaderMap) -> SignOutOutcome {
    match sessions.sign_out(headers).await {
        Ok(()) => SignOutOutcome::Navigate(AUTHENTICATION_PATH),
        Err(e) => {
            tracing::warn!("Sign-out failed: {}", e);
            SignOutOutcome::Notify(Notification::error(SIGN_OUT_FAILED))
        }
    }
}
