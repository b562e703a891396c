use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings shared by every binary in the upload platform, independent
/// of which credential schemes or verifiers it wires up.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Layered load: an optional settings file (default
    /// `upload-platform.*`, overridable via `CONFIG_FILE`), then
    /// `APP__*` environment variables on top.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "upload-platform".to_string());

        let config = Cfg::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
