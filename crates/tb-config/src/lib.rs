//! # tb-config
//!
//! Layered settings for topicboard binaries.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `config/default.toml`, then `config/{APP_ENV}.toml` (both optional)
//! 3. environment variables prefixed `TB`, e.g. `TB__SERVER__PORT=8080`

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub log: LogSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub seed: SeedSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx URL, e.g. `sqlite://topicboard.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` overrides it.
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub realm: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedSettings {
    /// Password given to fixture users that don't declare one.
    pub admin_password: Option<SecretString>,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("database.url", "sqlite://topicboard.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.filter", "info,tower_http=debug,sqlx=warn")?
        .set_default("log.json", false)?
        .set_default("auth.realm", "topicboard")
}

impl Settings {
    /// Loads `.env`, config files, and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        tracing::debug!(%env, "loading settings");

        let settings = defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                Environment::with_prefix("TB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let settings = defaults()?
            .add_source(File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_are_complete() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.database.url, "sqlite://topicboard.db");
        assert!(!settings.log.json);
        assert_eq!(settings.auth.realm, "topicboard");
        assert!(settings.seed.admin_password.is_none());
    }

    #[test]
    fn toml_overrides_defaults() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 9090

            [database]
            url = "sqlite::memory:"

            [seed]
            admin_password = "hunter2"
            "#,
        )
        .unwrap();
        assert_eq!(settings.bind_addr(), ("127.0.0.1".to_string(), 9090));
        assert_eq!(settings.database.url, "sqlite::memory:");
        assert_eq!(settings.database.max_connections, 5);
        let secret = settings.seed.admin_password.unwrap();
        assert_eq!(secret.expose_secret(), "hunter2");
    }

    #[test]
    fn secrets_stay_out_of_debug_output() {
        let settings = Settings::from_toml("[seed]\nadmin_password = \"hunter2\"").unwrap();
        assert!(!format!("{settings:?}").contains("hunter2"));
    }
}
