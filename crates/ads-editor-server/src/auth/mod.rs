pub mod cookie;
pub mod middleware;
pub mod session;

pub use middleware::session_middleware;
pub use session::{AuthFailure, SessionAuthenticator, SessionStatus, SessionToken, SESSION_MAX_AGE};
