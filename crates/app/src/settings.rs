//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden with `SPENDWISE__<SECTION>__<KEY>`
//! environment variables.
use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Parser)]
#[command(name = "spendwise")]
#[command(about = "Expense approval and wallet settlement server")]
pub struct Args {
    /// Settings file; the extension may be omitted.
    #[arg(long, env = "SPENDWISE_CONFIG")]
    pub config: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
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
pub struct Storage {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            public_prefix: default_public_prefix(),
        }
    }
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_public_prefix() -> String {
    "/uploads".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SlipOk {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub branch_id: String,
    #[serde(default = "default_slipok_url")]
    pub base_url: String,
    #[serde(default = "default_slipok_timeout")]
    pub timeout_secs: u64,
}

impl SlipOk {
    /// Verification is on only with a non-blank api key.
    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_slipok_url() -> String {
    engine::SLIPOK_DEFAULT_BASE_URL.to_string()
}

fn default_slipok_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub storage: Storage,
    pub slipok: Option<SlipOk>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        Self::load(args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SPENDWISE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn load_toml(content: &str) -> Settings {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        Settings::load(file.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn full_file() {
        let settings = load_toml(
            r#"
            [app]
            level = "debug"

            [server]
            bind = "0.0.0.0"
            port = 8080
            database = { sqlite = "spendwise.db" }

            [storage]
            upload_dir = "/srv/uploads"

            [slipok]
            api_key = "key"
            branch_id = "4242"
            timeout_secs = 3
            "#,
        );

        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 8080);
        assert_eq!(server.database, Database::Sqlite("spendwise.db".to_string()));
        assert_eq!(settings.storage.upload_dir, "/srv/uploads");
        assert_eq!(settings.storage.public_prefix, "/uploads");
        let slipok = settings.slipok.unwrap();
        assert!(slipok.enabled());
        assert_eq!(slipok.base_url, engine::SLIPOK_DEFAULT_BASE_URL);
        assert_eq!(slipok.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let settings = load_toml(
            r#"
            [server]
            port = 3000
            database = "memory"

            [slipok]
            api_key = "  "
            "#,
        );

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.unwrap().database, Database::Memory);
        assert_eq!(settings.storage.upload_dir, "./uploads");
        assert!(!settings.slipok.unwrap().enabled());
    }
}
