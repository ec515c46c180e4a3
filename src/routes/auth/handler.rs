use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    access::{self, ClientInfo, IssuedSession, SignOutOutcome},
    common::Notification,
    error::AppError,
    forms::{
        FormResponse, FormValues, LOGIN_MESSAGES, LoginForm, SIGN_UP_MESSAGES,
        SUBMISSION_IN_PROGRESS, SignUpForm, Submission, validate_login, validate_sign_up,
    },
    utils::{
        clear_session_cookie, error_codes, error_with_data_to_api_response, session_cookie,
        success_to_api_response,
    },
};

fn validation_failed(response: FormResponse) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        error_with_data_to_api_response(
            error_codes::VALIDATION_ERROR,
            "validation failed".to_string(),
            response,
        ),
    )
        .into_response()
}

fn already_submitting(err: AppError, values: FormValues) -> Response {
    let response = FormResponse {
        notification: Some(Notification::error(SUBMISSION_IN_PROGRESS)),
        ..Default::default()
    }
    .with_values(values);

    (
        err.status(),
        error_with_data_to_api_response(err.code(), SUBMISSION_IN_PROGRESS.to_string(), response),
    )
        .into_response()
}

/// 把提供方的结果转换为页面效果，成功时写入会话 cookie
fn finish_submission(
    state: &AppState,
    submission: Submission,
    result: Result<IssuedSession, AppError>,
    values: FormValues,
) -> Response {
    let response = FormResponse::from(submission.complete(&result));

    match result {
        Ok(issued) => {
            let cookie = session_cookie(
                &issued.token,
                state.config.session_expiration_secs,
                state.config.session_cookie_secure,
            );
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                success_to_api_response(response),
            )
                .into_response()
        }
        // 提供方失败只通知用户并回显输入，不作为错误向上抛出
        Err(e) => {
            let response = response.with_values(values);
            let msg = response
                .notification
                .as_ref()
                .map(|n| n.message.clone())
                .unwrap_or_default();
            (
                StatusCode::OK,
                error_with_data_to_api_response(e.code(), msg, response),
            )
                .into_response()
        }
    }
}

#[axum::debug_handler]
pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<SignUpForm>,
) -> Response {
    let values = FormValues::from(&form);
    let input = match validate_sign_up(&form) {
        Ok(input) => input,
        Err(errors) => return validation_failed(FormResponse::invalid(errors).with_values(values)),
    };

    let submission = match state.submissions.begin(SIGN_UP_MESSAGES, &input.email) {
        Ok(submission) => submission,
        Err(e) => return already_submitting(e, values),
    };

    let result = state
        .credentials
        .sign_up_email(input, ClientInfo::from_headers(&headers))
        .await;

    finish_submission(&state, submission, result, values)
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<LoginForm>,
) -> Response {
    let values = FormValues::from(&form);
    let input = match validate_login(&form) {
        Ok(input) => input,
        Err(errors) => return validation_failed(FormResponse::invalid(errors).with_values(values)),
    };

    let submission = match state.submissions.begin(LOGIN_MESSAGES, &input.email) {
        Ok(submission) => submission,
        Err(e) => return already_submitting(e, values),
    };

    let result = state
        .credentials
        .sign_in_email(input, ClientInfo::from_headers(&headers))
        .await;

    finish_submission(&state, submission, result, values)
}

/// 浏览器原生表单提交，期望页面跳转而不是 JSON
fn is_form_navigation(headers: &HeaderMap) -> bool {
    let header_contains = |name: header::HeaderName, needle: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|v| v.contains(needle))
    };

    header_contains(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        || header_contains(header::ACCEPT, "text/html")
}

#[axum::debug_handler]
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match access::sign_out(state.sessions.as_ref(), &headers).await {
        SignOutOutcome::Navigate(path) => (
            [(
                header::SET_COOKIE,
                clear_session_cookie(state.config.session_cookie_secure),
            )],
            Redirect::to(path),
        )
            .into_response(),
        // 失败时留在仪表盘并显示通知
        SignOutOutcome::Notify(_) if is_form_navigation(&headers) => {
            Redirect::to(&access::sign_out_failed_path()).into_response()
        }
        SignOutOutcome::Notify(notification) => {
            let msg = notification.message.clone();
            (
                StatusCode::OK,
                error_with_data_to_api_response(
                    error_codes::SIGN_OUT_FAILED,
                    msg,
                    FormResponse {
                        notification: Some(notification),
                        ..Default::default()
                    },
                ),
            )
                .into_response()
        }
    }
}
