use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::access::DASHBOARD_PATH;
use crate::common::Notification;
use crate::error::AppError;

pub const SUBMISSION_IN_PROGRESS: &str = "A submission is already in progress!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
}

/// 提供方返回后页面的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEffect {
    NavigateAndNotify {
        path: &'static str,
        notification: Notification,
    },
    Notify(Notification),
}

#[derive(Debug, Clone, Copy)]
pub struct SubmissionMessages {
    pub form: &'static str,
    pub success_path: &'static str,
    pub success: &'static str,
    pub failure: &'static str,
}

pub const SIGN_UP_MESSAGES: SubmissionMessages = SubmissionMessages {
    form: "sign-up",
    success_path: DASHBOARD_PATH,
    success: "Account created successfully!",
    failure: "Could not create your account!",
};

pub const LOGIN_MESSAGES: SubmissionMessages = SubmissionMessages {
    form: "login",
    success_path: DASHBOARD_PATH,
    success: "Signed in successfully!",
    failure: "Invalid email or password!",
};

/// 正在提交的表单，按 表单:邮箱 记录，跨请求共享
#[derive(Debug, Clone, Default)]
pub struct SubmissionTracker {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(messages: &SubmissionMessages, email: &str) -> String {
        format!("{}:{}", messages.form, email.trim().to_lowercase())
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<String>> {
        // 锁中只有集合操作，中毒时数据仍然可用
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self, messages: &SubmissionMessages, email: &str) -> SubmitState {
        if self.in_flight().contains(&Self::key(messages, email)) {
            SubmitState::Submitting
        } else {
            SubmitState::Idle
        }
    }

    /// `idle -> submitting`，同一表单和邮箱在完成前再次提交会被拒绝
    pub fn begin(
        &self,
        messages: SubmissionMessages,
        email: &str,
    ) -> Result<Submission, AppError> {
        let key = Self::key(&messages, email);
        if !self.in_flight().insert(key.clone()) {
            tracing::debug!("Rejected concurrent {} submission", messages.form);
            return Err(AppError::SubmissionInProgress);
        }

        Ok(Submission {
            tracker: self.clone(),
            key,
            messages,
        })
    }
}

/// 进行中的提交，完成或丢弃后回到 `idle`
#[derive(Debug)]
pub struct Submission {
    tracker: SubmissionTracker,
    key: String,
    messages: SubmissionMessages,
}

impl Submission {
    pub fn complete<T, E: Display>(self, result: &Result<T, E>) -> FormEffect {
        match result {
            Ok(_) => FormEffect::NavigateAndNotify {
                path: self.messages.success_path,
                notification: Notification::success(self.messages.success),
            },
            Err(e) => {
                tracing::warn!("Form submission rejected by provider: {}", e);
                FormEffect::Notify(Notification::error(self.messages.failure))
            }
        }
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        self.tracker.in_flight().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NotificationLevel;

    const EMAIL: &str = "ana@clinic.com";

    #[test]
    fn starts_idle() {
        let tracker = SubmissionTracker::new();
        assert_eq!(tracker.state(&SIGN_UP_MESSAGES, EMAIL), SubmitState::Idle);
    }

    #[test]
    fn second_begin_is_rejected_while_submitting() {
        let tracker = SubmissionTracker::new();
        let _first = tracker.begin(SIGN_UP_MESSAGES, EMAIL).unwrap();

        assert_eq!(tracker.state(&SIGN_UP_MESSAGES, EMAIL), SubmitState::Submitting);
        assert!(matches!(
            tracker.begin(SIGN_UP_MESSAGES, " ANA@clinic.com "),
            Err(AppError::SubmissionInProgress)
        ));
    }

    #[test]
    fn other_forms_and_emails_are_independent() {
        let tracker = SubmissionTracker::new();
        let _sign_up = tracker.begin(SIGN_UP_MESSAGES, EMAIL).unwrap();

        assert!(tracker.begin(LOGIN_MESSAGES, EMAIL).is_ok());
        assert!(tracker.begin(SIGN_UP_MESSAGES, "joao@clinic.com").is_ok());
    }

    #[test]
    fn success_navigates_to_dashboard_and_returns_to_idle() {
        let tracker = SubmissionTracker::new();
        let submission = tracker.begin(SIGN_UP_MESSAGES, EMAIL).unwrap();
        let effect = submission.complete(&Ok::<(), AppError>(()));

        assert_eq!(
            effect,
            FormEffect::NavigateAndNotify {
                path: "/dashboard",
                notification: Notification::success("Account created successfully!"),
            }
        );
        assert_eq!(tracker.state(&SIGN_UP_MESSAGES, EMAIL), SubmitState::Idle);
    }

    #[test]
    fn failure_only_notifies_and_allows_retry() {
        let tracker = SubmissionTracker::new();
        let submission = tracker.begin(SIGN_UP_MESSAGES, EMAIL).unwrap();
        let effect = submission.complete(&Err::<(), _>(AppError::Conflict("taken".into())));

        match effect {
            FormEffect::Notify(n) => assert_eq!(n.level, NotificationLevel::Error),
            other => panic!("unexpected effect: {other:?}"),
        }
        assert!(tracker.begin(SIGN_UP_MESSAGES, EMAIL).is_ok());
    }

    #[test]
    fn dropping_an_unfinished_submission_releases_it() {
        let tracker = SubmissionTracker::new();
        drop(tracker.begin(LOGIN_MESSAGES, EMAIL).unwrap());
        assert_eq!(tracker.state(&LOGIN_MESSAGES, EMAIL), SubmitState::Idle);
    }
}
