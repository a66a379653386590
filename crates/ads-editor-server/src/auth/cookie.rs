//! Session cookie assembly and extraction.
//!
//! Every issued cookie carries HttpOnly and SameSite=Lax. The Secure flag
//! is added automatically whenever the serving host is not loopback, so
//! local development works over plain HTTP while deployed instances never
//! downgrade cookie protection.

use axum::http::{header, HeaderMap};

use super::session::SESSION_MAX_AGE;

pub const SESSION_COOKIE: &str = "session";

/// Build the `Set-Cookie` value for a freshly issued token.
pub fn session_cookie(token: &str, host: Option<&str>) -> String {
    let mut parts = vec![
        format!("{}={}", SESSION_COOKIE, token),
        format!("Max-Age={}", SESSION_MAX_AGE),
        "Path=/".to_string(),
        "HttpOnly".to_string(),
        "SameSite=Lax".to_string(),
    ];

    let host = host.unwrap_or("localhost");
    if !host_is_loopback(host) {
        parts.push("Secure".to_string());
    }

    parts.join("; ")
}

/// `Set-Cookie` value that clears the session on logout.
pub fn clear_cookie() -> String {
    format!(
        "{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE
    )
}

pub fn host_is_loopback(host: &str) -> bool {
    host.contains("localhost") || host.contains("127.0.0.1") || host.contains("[::1]")
}

/// Pull the session token out of the `Cookie` request header, if any.
pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for pair in raw.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == SESSION_COOKIE {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Host header as a plain string, when present and valid UTF-8.
pub fn host_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_carries_required_attributes() {
        let cookie = session_cookie("tok", Some("localhost:8080"));
        assert!(cookie.starts_with("session=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn secure_flag_depends_on_host() {
        assert!(!session_cookie("t", Some("localhost:8080")).contains("Secure"));
        assert!(!session_cookie("t", Some("127.0.0.1")).contains("Secure"));
        assert!(!session_cookie("t", Some("[::1]:3000")).contains("Secure"));
        assert!(session_cookie("t", Some("ads.example.com")).contains("Secure"));
        // No Host header behaves like local development.
        assert!(!session_cookie("t", None).contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie();
        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn extracts_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=1:2:abcd; lang=en"),
        );
        assert_eq!(
            session_from_headers(&headers).as_deref(),
            Some("1:2:abcd")
        );
    }

    #[test]
    fn missing_or_foreign_cookies_yield_none() {
        assert_eq!(session_from_headers(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_from_headers(&headers), None);
    }
}
