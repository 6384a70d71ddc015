use std::{env, fmt::Display, fs::read_to_string, path::Path, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_ALLOWED_ORIGINS: &str =
    "https://pro.skyblock.bz,https://songvoter.coflnet.com,https://sky.coflnet.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyBackend {
    Webhook,
    Redis,
    Log,
}

impl FromStr for NotifyBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webhook" => Ok(Self::Webhook),
            "redis" => Ok(Self::Redis),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown notify backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub metrics_port: u16,
    pub storage: StorageBackend,
    pub redis_url: String,
    pub feedback_key: String,
    pub notify_backend: NotifyBackend,
    pub webhook_url: Option<String>,
    pub notify_channel: String,
    pub notify_topic: String,
    pub notify_timeout: Duration,
    pub notify_queue_capacity: usize,
    pub notify_drain: Duration,
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            metrics_port: 2112,
            storage: StorageBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            feedback_key: "feedback".to_string(),
            notify_backend: NotifyBackend::Webhook,
            webhook_url: None,
            notify_channel: "feedback".to_string(),
            notify_topic: "discord-messages".to_string(),
            notify_timeout: Duration::from_secs(10),
            notify_queue_capacity: 256,
            notify_drain: Duration::from_secs(5),
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {e}");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secrets_dir: String = try_load(&lookup, "SECRETS_DIR", "/run/secrets")?;

        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", "3000")?,
            metrics_port: try_load(&lookup, "METRICS_PORT", "2112")?,
            storage: try_load(&lookup, "STORAGE_BACKEND", "redis")?,
            redis_url: try_load(&lookup, "REDIS_URL", "redis://127.0.0.1:6379")?,
            feedback_key: try_load(&lookup, "FEEDBACK_KEY", "feedback")?,
            notify_backend: try_load(&lookup, "NOTIFY_BACKEND", "webhook")?,
            webhook_url: read_secret(&lookup, &secrets_dir, "WEBHOOK_URL"),
            notify_channel: try_load(&lookup, "NOTIFY_CHANNEL", "feedback")?,
            notify_topic: try_load(&lookup, "DISCORD_MESSAGES_TOPIC", "discord-messages")?,
            notify_timeout: Duration::from_secs(try_load(&lookup, "NOTIFY_TIMEOUT_SECS", "10")?),
            notify_queue_capacity: try_load(&lookup, "NOTIFY_QUEUE_CAPACITY", "256")?,
            notify_drain: Duration::from_secs(try_load(&lookup, "NOTIFY_DRAIN_SECS", "5")?),
            allowed_origins: split_origins(&try_load::<String, _>(
                &lookup,
                "ALLOWED_ORIGINS",
                DEFAULT_ALLOWED_ORIGINS,
            )?),
        })
    }
}

fn split_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        })
}

/// Env var first, then `{secrets_dir}/{name}` as mounted by docker secrets.
fn read_secret<F>(lookup: &F, secrets_dir: &str, secret_name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(secret_name).filter(|v| !v.trim().is_empty()) {
        return Some(value.trim().to_string());
    }

    let path = Path::new(secrets_dir).join(secret_name);

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}
