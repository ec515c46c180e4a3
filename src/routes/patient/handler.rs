use axum::{
    Extension,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    AppState, access::Session, error::AppError, routes::clinic::current_clinic,
    utils::success_to_api_response,
};

use super::model::{CreatePatientRequest, Patient};

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreatePatientRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let clinic_id = current_clinic(&state, &session.user.id).await?;

    let patient = Patient::create(&state.pool, clinic_id, req).await?;
    Ok((StatusCode::CREATED, success_to_api_response(patient)))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let clinic_id = current_clinic(&state, &session.user.id).await?;

    let patients = Patient::list_by_clinic(&state.pool, clinic_id).await?;
    Ok((StatusCode::OK, success_to_api_response(patients)))
}
