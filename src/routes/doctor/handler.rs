use axum::{
    Extension,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState, access::Session, error::AppError, routes::clinic::current_clinic,
    utils::success_to_api_response,
};

use super::model::{CreateDoctorRequest, Doctor};

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateDoctorRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.availability()?;
    let clinic_id = current_clinic(&state, &session.user.id).await?;

    let doctor = Doctor::create(&state.pool, clinic_id, req).await?;
    Ok((StatusCode::CREATED, success_to_api_response(doctor)))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let clinic_id = current_clinic(&state, &session.user.id).await?;

    let doctors = Doctor::list_by_clinic(&state.pool, clinic_id).await?;
    Ok((StatusCode::OK, success_to_api_response(doctors)))
}
