//! Stateless session tokens.
//!
//! A token is `"{issued}:{expires}:{hex tag}"` where the tag is
//! HMAC-SHA256 over `"session:{issued}:{expires}"` keyed with the
//! process-wide secret. Validity is fully determined by recomputation -
//! the server keeps no session table, so a restart with a fresh secret
//! simply invalidates every outstanding token.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

use crate::utils::Clock;

type HmacSha256 = Hmac<Sha256>;

/// Sessions live for 24 hours.
pub const SESSION_MAX_AGE: i64 = 60 * 60 * 24;

/// Generic login denial. Carries no detail beyond pass/fail.
#[derive(Error, Debug)]
#[error("authentication failed")]
pub struct AuthFailure;

/// Outcome of a session check. Only `Ok` and `Disabled` authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Ok,
    Disabled,
    Missing,
    Invalid,
    Expired,
}

impl SessionStatus {
    pub fn authorized(self) -> bool {
        matches!(self, SessionStatus::Ok | SessionStatus::Disabled)
    }

    pub fn reason(self) -> &'static str {
        match self {
            SessionStatus::Ok => "ok",
            SessionStatus::Disabled => "disabled",
            SessionStatus::Missing => "missing",
            SessionStatus::Invalid => "invalid",
            SessionStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionToken {
    pub issued: i64,
    pub expires: i64,
    tag: Vec<u8>,
}

impl SessionToken {
    /// Cookie-value encoding.
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.issued, self.expires, hex::encode(&self.tag))
    }

    /// Strict parse of a presented cookie value. `None` on any structural
    /// problem: wrong field count, non-numeric timestamps, bad hex.
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':');
        let issued = parts.next()?.parse::<i64>().ok()?;
        let expires = parts.next()?.parse::<i64>().ok()?;
        let tag = hex::decode(parts.next()?).ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            issued,
            expires,
            tag,
        })
    }
}

pub struct SessionAuthenticator {
    secret: Vec<u8>,
    password: String,
    clock: Arc<dyn Clock>,
}

impl SessionAuthenticator {
    pub fn new(secret: Vec<u8>, password: String, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret,
            password,
            clock,
        }
    }

    /// Empty configured password disables authentication entirely.
    pub fn disabled(&self) -> bool {
        self.password.is_empty()
    }

    /// Check a submitted password and mint a token on success.
    ///
    /// Returns `Ok(None)` when auth is disabled: every request is already
    /// authorized, so no cookie is needed. The comparison is constant-time
    /// over the byte strings.
    pub fn issue(&self, attempt: &str) -> Result<Option<SessionToken>, AuthFailure> {
        if self.disabled() {
            return Ok(None);
        }

        let matches: bool = attempt
            .as_bytes()
            .ct_eq(self.password.as_bytes())
            .into();
        if !matches {
            return Err(AuthFailure);
        }

        let issued = self.clock.now();
        let expires = issued + SESSION_MAX_AGE;
        let tag = self.sign(issued, expires).map_err(|_| AuthFailure)?;

        Ok(Some(SessionToken {
            issued,
            expires,
            tag,
        }))
    }

    /// Validate a presented cookie value.
    ///
    /// Fails closed: anything that does not parse is `Invalid`. The tag is
    /// recomputed and checked in constant time before expiry is even
    /// considered, so `Expired` always means "was genuine, is stale".
    pub fn verify(&self, cookie: Option<&str>) -> SessionStatus {
        if self.disabled() {
            return SessionStatus::Disabled;
        }

        let Some(raw) = cookie else {
            return SessionStatus::Missing;
        };
        let Some(token) = SessionToken::parse(raw) else {
            return SessionStatus::Invalid;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return SessionStatus::Invalid;
        };
        mac.update(Self::message(token.issued, token.expires).as_bytes());
        if mac.verify_slice(&token.tag).is_err() {
            return SessionStatus::Invalid;
        }

        if self.clock.now() > token.expires {
            debug!("Session expired at {}", token.expires);
            return SessionStatus::Expired;
        }

        SessionStatus::Ok
    }

    fn message(issued: i64, expires: i64) -> String {
        format!("session:{}:{}", issued, expires)
    }

    fn sign(&self, issued: i64, expires: i64) -> Result<Vec<u8>, hmac::digest::InvalidLength> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)?;
        mac.update(Self::message(issued, expires).as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            self.0
        }
    }

    fn authenticator(password: &str, now: i64) -> SessionAuthenticator {
        SessionAuthenticator::new(
            b"test-secret-key".to_vec(),
            password.to_string(),
            Arc::new(FixedClock(now)),
        )
    }

    #[test]
    fn issue_then_verify_is_ok() {
        let auth = authenticator("secret123", 1_700_000_000);
        let token = auth
            .issue("secret123")
            .expect("correct password accepted")
            .expect("auth enabled, token minted");

        assert_eq!(token.issued, 1_700_000_000);
        assert_eq!(token.expires, 1_700_000_000 + SESSION_MAX_AGE);
        assert_eq!(auth.verify(Some(&token.encode())), SessionStatus::Ok);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let auth = authenticator("secret123", 1_700_000_000);
        assert!(auth.issue("secret124").is_err());
        assert!(auth.issue("").is_err());
        assert!(auth.issue("secret1234").is_err());
    }

    #[test]
    fn token_expires_after_max_age() {
        let issue_time = 1_700_000_000;
        let token = authenticator("pw", issue_time)
            .issue("pw")
            .unwrap()
            .unwrap()
            .encode();

        // Same secret, clock moved one second past expiry.
        let later = authenticator("pw", issue_time + SESSION_MAX_AGE + 1);
        assert_eq!(later.verify(Some(&token)), SessionStatus::Expired);

        // Exactly at expiry still counts.
        let at_edge = authenticator("pw", issue_time + SESSION_MAX_AGE);
        assert_eq!(at_edge.verify(Some(&token)), SessionStatus::Ok);
    }

    #[test]
    fn tampered_tag_is_invalid() {
        let auth = authenticator("pw", 1_700_000_000);
        let encoded = auth.issue("pw").unwrap().unwrap().encode();

        // Flip one bit in the last hex digit of the tag.
        let mut bytes = encoded.into_bytes();
        let last = bytes.last_mut().unwrap();
        *last = if *last == b'0' { b'1' } else { b'0' };
        let forged = String::from_utf8(bytes).unwrap();

        assert_eq!(auth.verify(Some(&forged)), SessionStatus::Invalid);
    }

    #[test]
    fn tampered_expiry_is_invalid() {
        let auth = authenticator("pw", 1_700_000_000);
        let token = auth.issue("pw").unwrap().unwrap();

        // Extending the expiry without re-signing must not validate.
        let stretched = format!(
            "{}:{}:{}",
            token.issued,
            token.expires + 1_000_000,
            hex::encode(&token.tag)
        );
        assert_eq!(auth.verify(Some(&stretched)), SessionStatus::Invalid);
    }

    #[test]
    fn token_from_other_secret_is_invalid() {
        let issuer = SessionAuthenticator::new(
            b"key-a".to_vec(),
            "pw".to_string(),
            Arc::new(FixedClock(1_700_000_000)),
        );
        let verifier = SessionAuthenticator::new(
            b"key-b".to_vec(),
            "pw".to_string(),
            Arc::new(FixedClock(1_700_000_000)),
        );

        let token = issuer.issue("pw").unwrap().unwrap().encode();
        assert_eq!(verifier.verify(Some(&token)), SessionStatus::Invalid);
    }

    #[test]
    fn malformed_cookies_fail_closed() {
        let auth = authenticator("pw", 1_700_000_000);

        for raw in [
            "",
            "garbage",
            "1700000000",
            "1700000000:1700086400",
            "1700000000:1700086400:zzzz",
            "a:b:cafe",
            "1:2:3:4",
        ] {
            assert_eq!(
                auth.verify(Some(raw)),
                SessionStatus::Invalid,
                "expected invalid for {:?}",
                raw
            );
        }

        assert_eq!(auth.verify(None), SessionStatus::Missing);
    }

    #[test]
    fn disabled_auth_authorizes_everything() {
        let auth = authenticator("", 1_700_000_000);

        assert!(auth.disabled());
        assert_eq!(auth.verify(None), SessionStatus::Disabled);
        assert_eq!(auth.verify(Some("garbage")), SessionStatus::Disabled);
        assert!(auth.verify(None).authorized());

        // issue short-circuits before any token logic
        assert!(auth.issue("anything").unwrap().is_none());
    }
}
