//! Application settings.
//!
//! Read from `scaffale.toml` (override the path with `SCAFFALE_CONFIG`) and
//! from `SCAFFALE__`-prefixed environment variables. A missing `[server]`
//! section means there is nothing to run.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let path =
            std::env::var("SCAFFALE_CONFIG").unwrap_or_else(|_| "scaffale.toml".to_string());

        Config::builder()
            .set_default("app.level", "info")?
            .add_source(File::with_name(&path).required(false))
            .add_source(Environment::with_prefix("SCAFFALE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
