use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{AppState, access::Session, error::AppError, utils::success_to_api_response};

use super::model::{Clinic, CreateClinicRequest, Membership};

/// 当前诊所：调用者最早加入的那个
pub async fn current_clinic(state: &AppState, user_id: &str) -> Result<Uuid, AppError> {
    state
        .memberships
        .find_memberships(user_id)
        .await?
        .first()
        .map(|m| m.clinic_id)
        .ok_or(AppError::OnboardingRequired)
}

#[axum::debug_handler]
pub async fn create_clinic(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateClinicRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = req.validated_name()?;
    let clinic = Clinic::create_for_user(&state.pool, &session.user.id, name).await?;

    Ok((StatusCode::CREATED, success_to_api_response(clinic)))
}

#[axum::debug_handler]
pub async fn list_clinics(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let clinics = Clinic::list_for_user(&state.pool, &session.user.id).await?;
    Ok((StatusCode::OK, success_to_api_response(clinics)))
}

#[axum::debug_handler]
pub async fn delete_clinic(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(clinic_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !Membership::exists(&state.pool, &session.user.id, clinic_id).await? {
        return Err(AppError::Forbidden("not a member of this clinic".into()));
    }

    if !Clinic::delete(&state.pool, clinic_id).await? {
        return Err(AppError::NotFound("clinic not found".into()));
    }

    tracing::info!("User {} deleted clinic {}", session.user.id, clinic_id);
    Ok((StatusCode::OK, success_to_api_response(clinic_id)))
}
