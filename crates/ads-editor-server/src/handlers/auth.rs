//! Login and logout flows.

use axum::{
    extract::{ConnectInfo, Extension},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::cookie::{clear_cookie, host_from_headers, session_cookie};
use crate::auth::SessionAuthenticator;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

/// POST /login: check the password and set the session cookie.
///
/// Success and failure both redirect; the failure redirect carries no
/// detail beyond pass/fail.
pub async fn login(
    Extension(auth): Extension<Arc<SessionAuthenticator>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    match auth.issue(&form.password) {
        Ok(Some(token)) => {
            info!("Login successful from {}", addr.ip());
            let cookie = session_cookie(&token.encode(), host_from_headers(&headers));
            (
                StatusCode::FOUND,
                [
                    (header::SET_COOKIE, cookie),
                    (header::LOCATION, "/ads_editor.html".to_string()),
                    (header::CACHE_CONTROL, "no-store".to_string()),
                ],
            )
                .into_response()
        }
        // Auth disabled: no cookie needed, straight to the editor.
        Ok(None) => (
            StatusCode::FOUND,
            [
                (header::LOCATION, "/ads_editor.html"),
                (header::CACHE_CONTROL, "no-store"),
            ],
        )
            .into_response(),
        Err(_) => {
            warn!("Failed login attempt from {}", addr.ip());
            (
                StatusCode::FOUND,
                [
                    (header::LOCATION, "/login?error=1"),
                    (header::CACHE_CONTROL, "no-store"),
                ],
            )
                .into_response()
        }
    }
}

/// POST /logout: clear the cookie and return to the login page.
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [
            (header::SET_COOKIE, clear_cookie()),
            (header::LOCATION, "/login".to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
    )
}
