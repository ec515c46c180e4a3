pub mod appointment;
pub mod auth;
pub mod clinic;
pub mod doctor;
pub mod page;
pub mod patient;

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::{AppState, error::AppError, utils::success_to_api_response};

/// 存活检查，同时确认数据库可用
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;
    Ok((StatusCode::OK, success_to_api_response("ok")))
}
