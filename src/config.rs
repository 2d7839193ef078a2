use chrono::TimeDelta;
use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::{DEFAULT_API_CALLS_PER_HOUR, DEFAULT_EXPLORER_URL, DEFAULT_STORE_WINDOW};
use crate::halving::{AVERAGE_BLOCK_TIME_SECS, BLOCKS_PER_HALVING, HalvingParams};

pub const DEFAULT_DATA_FILE: &str = "block_data.txt";
pub const DEFAULT_STATUS_INTERVAL_SECS: u64 = 45;
pub const DEFAULT_ALERT_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_ALERT_THRESHOLD_SECS: i64 = 24 * 60 * 60;
pub const DEFAULT_POLL_MAX_BACKOFF_SECS: u64 = 600;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ALERT_MESSAGE: &str =
    "@everyone The Bitcoin halving is less than 24 hours away! 🚀";
pub const DEFAULT_ALERT_IMAGE_URL: &str = "https://bitcoin.org/img/icons/opengraph.png";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Runtime settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub explorer_token: Option<String>,
    pub explorer_url: String,
    pub data_file: PathBuf,
    pub blocks_per_halving: u64,
    pub average_block_time_secs: i64,
    pub api_calls_per_hour: u64,
    pub status_interval: Duration,
    pub alert_interval: Duration,
    pub alert_threshold_secs: i64,
    pub alert_message: String,
    pub alert_image_url: String,
    pub store_window: usize,
    pub poll_max_backoff: Duration,
    pub http_timeout: Duration,
    pub status_api_enabled: bool,
    pub host: String,
    pub port: u16,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let discord_token = text("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let api_calls_per_hour = parsed(&lookup, "API_CALLS_PER_HOUR", DEFAULT_API_CALLS_PER_HOUR);
        if !(1..=3600).contains(&api_calls_per_hour) {
            return Err(ConfigError::Invalid {
                name: "API_CALLS_PER_HOUR",
                reason: "must be between 1 and 3600".into(),
            });
        }
        let blocks_per_halving = parsed(&lookup, "BLOCKS_PER_HALVING", BLOCKS_PER_HALVING);
        if blocks_per_halving == 0 {
            return Err(ConfigError::Invalid {
                name: "BLOCKS_PER_HALVING",
                reason: "must be greater than zero".into(),
            });
        }

        Ok(Self {
            discord_token,
            explorer_token: text("BLOCKCYPHER_TOKEN"),
            explorer_url: text("BLOCKCYPHER_URL").unwrap_or_else(|| DEFAULT_EXPLORER_URL.into()),
            data_file: text("DATA_FILE")
                .unwrap_or_else(|| DEFAULT_DATA_FILE.into())
                .into(),
            blocks_per_halving,
            average_block_time_secs: parsed(
                &lookup,
                "AVERAGE_BLOCK_TIME_SECS",
                AVERAGE_BLOCK_TIME_SECS,
            ),
            api_calls_per_hour,
            status_interval: secs(&lookup, "STATUS_INTERVAL_SECS", DEFAULT_STATUS_INTERVAL_SECS),
            alert_interval: secs(&lookup, "ALERT_INTERVAL_SECS", DEFAULT_ALERT_INTERVAL_SECS),
            alert_threshold_secs: parsed(
                &lookup,
                "ALERT_THRESHOLD_SECS",
                DEFAULT_ALERT_THRESHOLD_SECS,
            ),
            alert_message: text("ALERT_MESSAGE").unwrap_or_else(|| DEFAULT_ALERT_MESSAGE.into()),
            alert_image_url: text("ALERT_IMAGE_URL")
                .unwrap_or_else(|| DEFAULT_ALERT_IMAGE_URL.into()),
            store_window: parsed(&lookup, "STORE_WINDOW", DEFAULT_STORE_WINDOW).max(1),
            poll_max_backoff: secs(&lookup, "POLL_MAX_BACKOFF_SECS", DEFAULT_POLL_MAX_BACKOFF_SECS),
            http_timeout: secs(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
            status_api_enabled: parsed(&lookup, "STATUS_API_ENABLED", true),
            host: text("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT", 8080),
        })
    }

    /// Poll period that keeps the explorer within the hourly call budget.
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs((3600 / self.api_calls_per_hour.max(1)).max(1))
    }

    pub fn halving_params(&self) -> HalvingParams {
        HalvingParams {
            blocks_per_halving: self.blocks_per_halving,
            fallback_block_time: TimeDelta::try_seconds(self.average_block_time_secs)
                .unwrap_or_else(|| TimeDelta::seconds(AVERAGE_BLOCK_TIME_SECS)),
        }
    }
}

fn parsed<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("CONFIG - {}={:?} is not valid, using the default", name, raw);
            default
        }),
    }
}

fn secs<F>(lookup: &F, name: &str, default: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    Duration::from_secs(parsed(lookup, name, default).max(1))
}
