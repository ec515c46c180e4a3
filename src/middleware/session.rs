use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, access, error::AppError};

/// 拒绝匿名请求，并把会话放入请求扩展
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session = access::resolve_session(state.sessions.as_ref(), req.headers())
        .await
        .ok_or(AppError::Unauthorized)?;

    tracing::debug!("Request {} by user {}", req.uri().path(), session.user.id);
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
