use std::collections::HashMap;
use std::fmt;

use actix_web::cookie::Key;

use crate::models::workflow::Limits;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MEDIA_ROOT: &str = "data/media";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_EVALUATION_MARK: i64 = 100;
const MAX_EVALUATION_MARK_CEILING: i64 = 1_000_000;

/// Runtime configuration, read from the environment (and `.env` via dotenvy in `main`).
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub session_key: Option<String>,
    pub media_root: String,
    pub max_upload_bytes: usize,
    pub max_evaluation_mark: i64,
    pub allow_admin_registration: bool,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("media_root", &self.media_root)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("max_evaluation_mark", &self.max_evaluation_mark)
            .field("allow_admin_registration", &self.allow_admin_registration)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| ConfigError("DATABASE_URL must be set".to_string()))?
            .to_string();

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(v) => parse_positive(v, "MAX_UPLOAD_BYTES")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let max_evaluation_mark = match get("MAX_EVALUATION_MARK") {
            Some(v) => {
                let mark = parse_positive::<i64>(v, "MAX_EVALUATION_MARK")?;
                if mark > MAX_EVALUATION_MARK_CEILING {
                    return Err(ConfigError(format!(
                        "MAX_EVALUATION_MARK must be at most {MAX_EVALUATION_MARK_CEILING}, got '{v}'"
                    )));
                }
                mark
            }
            None => DEFAULT_MAX_EVALUATION_MARK,
        };

        let allow_admin_registration = match get("ALLOW_ADMIN_REGISTRATION") {
            Some(v) => parse_bool(v, "ALLOW_ADMIN_REGISTRATION")?,
            None => true,
        };

        Ok(Config {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR).to_string(),
            session_key: get("SESSION_KEY").map(String::from),
            media_root: get("MEDIA_ROOT").unwrap_or(DEFAULT_MEDIA_ROOT).to_string(),
            max_upload_bytes,
            max_evaluation_mark,
            allow_admin_registration,
            admin_username: get("ADMIN_USERNAME").map(String::from),
            admin_password: get("ADMIN_PASSWORD").map(String::from),
        })
    }

    pub fn limits(&self) -> Limits {
        Limits { max_evaluation_mark: self.max_evaluation_mark }
    }

    /// Cookie-session key. A missing or short `SESSION_KEY` falls back to a random key.
    pub fn cookie_key(&self) -> Key {
        match &self.session_key {
            Some(val) if val.len() >= 64 => {
                log::info!("Using SESSION_KEY from environment");
                Key::from(val.as_bytes())
            }
            Some(val) => {
                log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
                Key::generate()
            }
            None => {
                log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
                Key::generate()
            }
        }
    }
}

fn parse_positive<T>(value: &str, key: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError(format!("{key} must be a positive integer, got '{value}'"))),
    }
}

fn parse_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError(format!("{key} must be a boolean, got '{value}'"))),
    }
}
