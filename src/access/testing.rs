// 测试用的内存实现

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{
    ClientInfo, CredentialProvider, IssuedSession, MembershipStore, Session, SessionProvider,
    SessionUser,
};
use crate::error::AppError;
use crate::forms::{LoginInput, SignUpInput};
use crate::routes::clinic::Membership;

pub fn session_for(user_id: &str, name: &str, email: &str) -> Session {
    Session {
        id: Uuid::new_v4().to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        user: SessionUser {
            id: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            image: None,
        },
    }
}

pub fn membership(user_id: &str, clinic_id: Uuid) -> Membership {
    Membership {
        user_id: user_id.to_string(),
        clinic_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct FakeSessions {
    session: Option<Session>,
    lookup_fails: bool,
    sign_out_fails: bool,
}

impl FakeSessions {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
            ..Default::default()
        }
    }

    pub fn failing_lookup() -> Self {
        Self {
            lookup_fails: true,
            ..Default::default()
        }
    }

    pub fn failing_sign_out() -> Self {
        Self::anonymous().with_failing_sign_out()
    }

    pub fn with_failing_sign_out(mut self) -> Self {
        self.sign_out_fails = true;
        self
    }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    async fn get_session(&self, _headers: &HeaderMap) -> Result<Option<Session>, AppError> {
        if self.lookup_fails {
            return Err(AppError::Internal("session store unavailable".into()));
        }
        Ok(self.session.clone())
    }

    async fn sign_out(&self, _headers: &HeaderMap) -> Result<(), AppError> {
        if self.sign_out_fails {
            return Err(AppError::Internal("session store unavailable".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMemberships {
    memberships: Vec<Membership>,
    fails: bool,
    calls: AtomicUsize,
}

impl FakeMemberships {
    pub fn new(memberships: Vec<Membership>) -> Self {
        Self {
            memberships,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipStore for FakeMemberships {
    async fn find_memberships(&self, user_id: &str) -> Result<Vec<Membership>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(AppError::Internal("membership query failed".into()));
        }
        Ok(self
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeCredentials {
    fails: bool,
    calls: AtomicUsize,
}

impl FakeCredentials {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            fails: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn issue(&self, name: &str, email: &str) -> Result<IssuedSession, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(AppError::Conflict("email already registered".into()));
        }
        Ok(IssuedSession {
            token: "test-token".into(),
            expires_at: Utc::now() + Duration::hours(1),
            user: SessionUser {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                email: email.to_string(),
                image: None,
            },
        })
    }
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn sign_up_email(
        &self,
        input: SignUpInput,
        _client: ClientInfo,
    ) -> Result<IssuedSession, AppError> {
        self.issue(&input.name, &input.email)
    }

    async fn sign_in_email(
        &self,
        input: LoginInput,
        _client: ClientInfo,
    ) -> Result<IssuedSession, AppError> {
        self.issue("Signed In", &input.email)
    }
}
