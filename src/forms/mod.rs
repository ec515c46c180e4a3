// 登录与注册表单校验，未通过校验的输入不会交给凭证提供方

mod submission;

pub use submission::{
    FormEffect, LOGIN_MESSAGES, SIGN_UP_MESSAGES, SUBMISSION_IN_PROGRESS, Submission,
    SubmissionMessages, SubmissionTracker, SubmitState,
};

use serde::{Deserialize, Serialize};

use crate::common::Notification;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const NAME_MIN_LEN: usize = 2;

pub const INVALID_EMAIL: &str = "Invalid email";
pub const INVALID_PASSWORD: &str = "Invalid password";
pub const NAME_REQUIRED: &str = "Name is required";
pub const CONFIRM_REQUIRED: &str = "Confirm your password";
pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// 已通过校验，name 与 password 已 trim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// 回显给页面的非敏感字段，密码从不回显
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
}

impl From<&LoginForm> for FormValues {
    fn from(form: &LoginForm) -> Self {
        Self {
            name: None,
            email: form.email.clone(),
        }
    }
}

impl From<&SignUpForm> for FormValues {
    fn from(form: &SignUpForm) -> Self {
        Self {
            name: Some(form.name.clone()),
            email: form.email.clone(),
        }
    }
}

/// 表单 POST 的响应体
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<FormValues>,
    pub errors: Vec<FieldError>,
}

impl FormResponse {
    pub fn invalid(errors: Vec<FieldError>) -> Self {
        Self {
            errors,
            ..Default::default()
        }
    }

    pub fn with_values(mut self, values: FormValues) -> Self {
        self.values = Some(values);
        self
    }
}

impl From<FormEffect> for FormResponse {
    fn from(effect: FormEffect) -> Self {
        match effect {
            FormEffect::NavigateAndNotify { path, notification } => Self {
                redirect: Some(path),
                notification: Some(notification),
                ..Default::default()
            },
            FormEffect::Notify(notification) => Self {
                notification: Some(notification),
                ..Default::default()
            },
        }
    }
}

/// 密码规则逐项结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordRules {
    pub lowercase: bool,
    pub uppercase: bool,
    pub digit: bool,
    pub special: bool,
    pub min_length: bool,
}

impl PasswordRules {
    pub fn check(password: &str) -> Self {
        Self {
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            digit: password.chars().any(|c| c.is_ascii_digit()),
            // 非单词字符或下划线
            special: password.chars().any(|c| !c.is_ascii_alphanumeric()),
            min_length: char_len(password) >= PASSWORD_MIN_LEN,
        }
    }

    pub fn all(&self) -> bool {
        self.lowercase && self.uppercase && self.digit && self.special && self.min_length
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn is_valid_email(email: &str) -> bool {
    validator::validate_email(email)
}

pub fn validate_login(form: &LoginForm) -> Result<LoginInput, Vec<FieldError>> {
    let mut errors = Vec::new();

    if !is_valid_email(&form.email) {
        errors.push(FieldError::new("email", INVALID_EMAIL));
    }

    let password = form.password.trim();
    if char_len(password) < PASSWORD_MIN_LEN {
        errors.push(FieldError::new("password", INVALID_PASSWORD));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(LoginInput {
        email: form.email.clone(),
        password: password.to_string(),
    })
}

pub fn validate_sign_up(form: &SignUpForm) -> Result<SignUpInput, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = form.name.trim();
    if char_len(name) < NAME_MIN_LEN {
        errors.push(FieldError::new("name", NAME_REQUIRED));
    }

    if !is_valid_email(&form.email) {
        errors.push(FieldError::new("email", INVALID_EMAIL));
    }

    let password = form.password.trim();
    if !PasswordRules::check(password).all() {
        errors.push(FieldError::new("password", INVALID_PASSWORD));
    }

    // 确认密码不做 trim
    if char_len(&form.confirm_password) < PASSWORD_MIN_LEN {
        errors.push(FieldError::new("confirm_password", CONFIRM_REQUIRED));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    if password != form.confirm_password {
        return Err(vec![FieldError::new(
            "confirm_password",
            PASSWORDS_DO_NOT_MATCH,
        )]);
    }

    Ok(SignUpInput {
        name: name.to_string(),
        email: form.email.clone(),
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(password: &str, confirm: &str) -> SignUpForm {
        SignUpForm {
            name: "Ana Souza".into(),
            email: "ana@clinic.test".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn strong_password_is_accepted() {
        let input = validate_sign_up(&sign_up("Abcdef1!", "Abcdef1!")).unwrap();
        assert_eq!(input.password, "Abcdef1!");
        assert_eq!(input.name, "Ana Souza");
    }

    #[test]
    fn lowercase_only_password_is_rejected() {
        let errors = validate_sign_up(&sign_up("abcdefgh", "abcdefgh")).unwrap_err();
        assert_eq!(fields(&errors), vec!["password"]);
        assert_eq!(errors[0].message, INVALID_PASSWORD);
    }

    #[test]
    fn each_character_class_is_required() {
        for password in ["ABCDEF1!", "abcdef1!", "Abcdefg!", "Abcdefg1"] {
            let rules = PasswordRules::check(password);
            assert!(rules.min_length);
            assert!(!rules.all(), "{password} should fail");
        }
    }

    #[test]
    fn underscore_counts_as_special() {
        assert!(PasswordRules::check("Abcdef1_").special);
        assert!(!PasswordRules::check("Abcdef12").special);
    }

    #[test]
    fn short_password_fails_even_with_every_class() {
        let rules = PasswordRules::check("Ab1!");
        assert!(rules.lowercase && rules.uppercase && rules.digit && rules.special);
        assert!(!rules.all());

        let errors = validate_login(&LoginForm {
            email: "ana@clinic.test".into(),
            password: "Ab1!xyz".into(),
        })
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["password"]);
    }

    #[test]
    fn length_is_measured_after_trimming() {
        let errors = validate_login(&LoginForm {
            email: "ana@clinic.test".into(),
            password: "  abc1234  ".into(),
        })
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["password"]);

        let input = validate_login(&LoginForm {
            email: "ana@clinic.test".into(),
            password: "  abcd1234  ".into(),
        })
        .unwrap();
        assert_eq!(input.password, "abcd1234");
    }

    #[test]
    fn login_rejects_malformed_email() {
        let errors = validate_login(&LoginForm {
            email: "not-an-email".into(),
            password: "whatever123".into(),
        })
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["email"]);
        assert_eq!(errors[0].message, INVALID_EMAIL);
    }

    #[test]
    fn mismatch_is_attached_to_confirmation_only() {
        let errors = validate_sign_up(&sign_up("Abcdef1!", "Abcdef1?")).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError {
                field: "confirm_password",
                message: PASSWORDS_DO_NOT_MATCH,
            }]
        );
    }

    #[test]
    fn short_confirmation_reports_length_not_mismatch() {
        let errors = validate_sign_up(&sign_up("Abcdef1!", "Abcdef1")).unwrap_err();
        assert_eq!(fields(&errors), vec!["confirm_password"]);
        assert_eq!(errors[0].message, CONFIRM_REQUIRED);
    }

    #[test]
    fn mismatch_is_not_reported_while_other_fields_fail() {
        let mut form = sign_up("Abcdef1!", "Different1!");
        form.name = " A ".into();
        let errors = validate_sign_up(&form).unwrap_err();
        assert_eq!(fields(&errors), vec!["name"]);
    }

    #[test]
    fn confirmation_is_compared_with_trimmed_password() {
        let errors = validate_sign_up(&sign_up(" Abcdef1! ", " Abcdef1! ")).unwrap_err();
        assert_eq!(fields(&errors), vec!["confirm_password"]);

        assert!(validate_sign_up(&sign_up(" Abcdef1! ", "Abcdef1!")).is_ok());
    }

    #[test]
    fn every_failing_field_is_reported() {
        let form = SignUpForm {
            name: "".into(),
            email: "nope".into(),
            password: "short".into(),
            confirm_password: "".into(),
        };
        let errors = validate_sign_up(&form).unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["name", "email", "password", "confirm_password"]
        );
    }

    #[test]
    fn echoed_values_leave_passwords_out() {
        let form = sign_up("Abcdef1!", "Abcdef1!");
        let response = FormResponse::default().with_values(FormValues::from(&form));
        let body = serde_json::to_value(response).unwrap();

        assert_eq!(body["values"]["name"], "Ana Souza");
        assert_eq!(body["values"]["email"], "ana@clinic.test");
        assert!(!body.to_string().contains("Abcdef1!"));

        let login = LoginForm {
            email: "ana@clinic.test".into(),
            password: "Abcdef1!".into(),
        };
        let values = FormValues::from(&login);
        assert_eq!(values.name, None);
    }
}
