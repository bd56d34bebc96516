use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://catalog.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_EBS_BASE_URL: &str = "https://ebs.iuc.edu.tr";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub ebs_base_url: String,
    pub sync_interval: Duration,
    pub sync_enabled: bool,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so it can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::config(format!("BIND_ADDR is invalid: {}", e)))?;

        let ebs_base_url =
            lookup("EBS_BASE_URL").unwrap_or_else(|| DEFAULT_EBS_BASE_URL.to_string());
        url::Url::parse(&ebs_base_url)
            .map_err(|e| AppError::config(format!("EBS_BASE_URL is invalid: {}", e)))?;

        let interval_secs = parse_u64(&lookup, "SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(AppError::config("SYNC_INTERVAL_SECS must be greater than zero"));
        }

        let sync_enabled = match lookup("SYNC_ENABLED") {
            None => true,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(AppError::config(format!(
                        "SYNC_ENABLED must be a boolean, got '{}'",
                        other
                    )));
                }
            },
        };

        let timeout_secs = parse_u64(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            database_url,
            bind_addr,
            ebs_base_url,
            sync_interval: Duration::from_secs(interval_secs),
            sync_enabled,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| AppError::config(format!("{} is invalid: {}", key, e))),
    }
}
