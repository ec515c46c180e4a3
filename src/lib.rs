use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use config::Config;
use sqlx::PgPool;

use access::{CredentialProvider, MembershipStore, SessionProvider};
use forms::SubmissionTracker;

pub mod access;
pub mod common;
pub mod config;
pub mod database;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub sessions: Arc<dyn SessionProvider>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub memberships: Arc<dyn MembershipStore>,
    pub submissions: SubmissionTracker,
}

/// 组装全部路由；限流和 CORS 由 main 在外层添加
pub fn app(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(routes::page::index))
        .route(access::DASHBOARD_PATH, get(routes::page::dashboard))
        .route(access::AUTHENTICATION_PATH, get(routes::page::authentication))
        .route(access::CLINIC_FORM_PATH, get(routes::page::clinic_form));

    let public_routes = Router::new()
        .route("/health", get(routes::health))
        .route("/authentication/login", post(routes::auth::login))
        .route("/authentication/sign-up", post(routes::auth::sign_up))
        .route(access::SIGN_OUT_PATH, post(routes::auth::sign_out));

    let protected_routes = Router::new()
        .route(
            "/clinics",
            get(routes::clinic::list_clinics).post(routes::clinic::create_clinic),
        )
        .route("/clinics/{clinic_id}", delete(routes::clinic::delete_clinic))
        .route(
            "/doctors",
            get(routes::doctor::list_doctors).post(routes::doctor::create_doctor),
        )
        .route(
            "/patients",
            get(routes::patient::list_patients).post(routes::patient::create_patient),
        )
        .route(
            "/appointments",
            get(routes::appointment::list_appointments)
                .post(routes::appointment::create_appointment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    Router::new()
        .merge(pages)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .with_state(state)
}
