use std::sync::LazyLock;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

/// Process-wide configuration, loaded once at startup.
pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().unwrap_or_else(|e| panic!("invalid configuration: {e}")));

const ENV_KEYS: &[&str] = &[
    "database_url",
    "database_name",
    "port",
    "loglevel",
    "smtp_host",
    "smtp_port",
    "smtp_username",
    "smtp_password",
    "smtp_from",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_name: String,
    pub port: u16,
    pub loglevel: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "mongodb://127.0.0.1:27017".to_string(),
            database_name: "therapy_center".to_string(),
            port: 8000,
            loglevel: "info".to_string(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
        }
    }
}

/// SMTP transport settings; only produced when mail is actually configured.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl Config {
    /// Defaults overlaid with environment variables (see `ENV_KEYS`).
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
    }

    /// Mail is configured when a host and a from-address are both present.
    /// Credentials are optional; some relays accept anonymous senders.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self.smtp_host.clone()?;
        let from = self.smtp_from.clone()?;
        Some(SmtpSettings {
            host,
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from,
        })
    }
}
