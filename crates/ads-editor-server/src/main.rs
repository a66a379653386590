use anyhow::Result;
use rand::RngCore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use ads_editor_server::auth::SessionAuthenticator;
use ads_editor_server::config::Settings;
use ads_editor_server::router::build_router;
use ads_editor_server::storage::DatasetStore;
use ads_editor_server::utils::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,ads_editor_server=debug".to_string()),
        )
        .with_target(true)
        .init();

    info!("🚀 Starting Ads Editor Server...");

    // Load configuration
    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    // Resolve the HMAC secret
    let secret = match settings.auth.secret_key.as_deref() {
        Some(key) if !key.is_empty() => key.as_bytes().to_vec(),
        _ => {
            warn!("No secret key configured: generated a random one (sessions reset on restart)");
            let mut key = [0u8; 32];
            rand::rng().fill_bytes(&mut key);
            key.to_vec()
        }
    };

    let clock = Arc::new(SystemClock);

    let auth = Arc::new(SessionAuthenticator::new(
        secret,
        settings.auth.password.clone(),
        clock.clone(),
    ));
    if auth.disabled() {
        warn!("Auth DISABLED: set APP__AUTH__PASSWORD to require a password");
    } else {
        info!("Auth ENABLED: password required to access editor");
    }

    let store = Arc::new(DatasetStore::open(&settings.storage, clock)?);
    info!(
        "✅ Dataset store ready (live file: {}, data dir: {})",
        store.live_path().display(),
        settings.storage.data_dir.display()
    );

    // Build router
    let app = build_router(auth, store, &settings.storage.static_root);

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);
    info!("Editor at http://localhost:{}/ads_editor.html", settings.server.port);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
