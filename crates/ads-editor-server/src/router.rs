use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, get_service, post},
    Extension, Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::auth::{session_middleware, SessionAuthenticator};
use crate::handlers;
use crate::storage::DatasetStore;

/// Compose the HTTP surface: public login/health routes merged with the
/// session-gated editor routes.
pub fn build_router(
    auth: Arc<SessionAuthenticator>,
    store: Arc<DatasetStore>,
    static_root: &Path,
) -> Router {
    // Public routes (no session check)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route(
            "/login",
            get_service(ServeFile::new(static_root.join("login.html")))
                .post(handlers::auth::login),
        )
        // Logout always works, session or not: it only clears the cookie.
        .route("/logout", post(handlers::auth::logout));

    // Protected routes (session middleware); the static editor document
    // and its assets are gated too.
    let protected_routes = Router::new()
        .route("/", get(handlers::dataset::index))
        .route("/ads_data.json", get(handlers::dataset::get_dataset))
        .route("/save", post(handlers::dataset::save_dataset))
        .fallback_service(ServeDir::new(static_root))
        .layer(middleware::from_fn(session_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Shared state
        .layer(Extension(auth))
        .layer(Extension(store))
        // CORS
        .layer(CorsLayer::permissive())
        // Tracing
        .layer(TraceLayer::new_for_http())
        // Body limit (untuk save payload - max 10MB)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}
