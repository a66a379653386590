use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::cookie::session_from_headers;
use crate::auth::SessionAuthenticator;
use crate::utils::error::ApiError;

/// Session gate for every protected route.
///
/// Browser navigation (GET) is bounced to the login page; API calls get a
/// 401 so the editing client can tell the user instead of silently losing
/// a save.
pub async fn session_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<Arc<SessionAuthenticator>>()
        .ok_or_else(|| ApiError::InternalError("Session authenticator not configured".to_string()))?
        .clone();

    let cookie = session_from_headers(request.headers());
    let status = auth.verify(cookie.as_deref());

    if status.authorized() {
        debug!("Session check passed ({})", status.reason());
        return Ok(next.run(request).await);
    }

    warn!(
        "Unauthenticated {} {} ({})",
        request.method(),
        request.uri().path(),
        status.reason()
    );

    if request.method() == Method::GET {
        Ok((
            StatusCode::FOUND,
            [
                (header::LOCATION, "/login"),
                (header::CACHE_CONTROL, "no-store"),
            ],
        )
            .into_response())
    } else {
        Err(ApiError::Unauthorized("Not authenticated".to_string()))
    }
}
