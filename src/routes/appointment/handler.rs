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

use super::model::{Appointment, CreateAppointmentRequest};

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let clinic_id = current_clinic(&state, &session.user.id).await?;

    let appointment = Appointment::create(&state.pool, clinic_id, req).await?;
    tracing::info!(
        "Booked appointment {} in clinic {}",
        appointment.id,
        clinic_id
    );
    Ok((StatusCode::CREATED, success_to_api_response(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let clinic_id = current_clinic(&state, &session.user.id).await?;

    let appointments = Appointment::list_by_clinic(&state.pool, clinic_id).await?;
    Ok((StatusCode::OK, success_to_api_response(appointments)))
}
