use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared editor password. Empty disables authentication entirely.
    pub password: String,
    /// HMAC secret for session tokens. When unset a random key is
    /// generated at startup, invalidating sessions across restarts.
    pub secret_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Durable storage directory; point at a mounted volume in hosted
    /// deployments.
    pub data_dir: PathBuf,
    pub dataset_file: String,
    /// Bundled default dataset used to seed an empty data directory.
    pub seed_path: PathBuf,
    pub static_root: PathBuf,
    pub max_backups: usize,
}

impl Settings {
    /// Defaults < optional `config/settings` file < `APP__`-prefixed
    /// environment variables (e.g. `APP__AUTH__PASSWORD`).
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("auth.password", "")?
            .set_default("storage.data_dir", "data")?
            .set_default("storage.dataset_file", "ads_data.json")?
            .set_default("storage.seed_path", "static/ads_data.json")?
            .set_default("storage.static_root", "static")?
            .set_default("storage.max_backups", 10)?
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
