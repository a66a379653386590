use chrono::Utc;

/// Clock seam so session expiry and backup naming are testable without
/// real waiting. Both the authenticator and the dataset store take an
/// `Arc<dyn Clock>`.
pub trait Clock: Send + Sync {
    /// Current time as seconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}
