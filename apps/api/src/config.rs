use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::layout::Measurement;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SESSION_TTL_SECS: u64 = 2 * 60 * 60;
const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Measurement backend used for every pagination (`LAYOUT_MEASUREMENT`).
    pub layout_measurement: Measurement,
    /// Request body cap for uploads and page-image exports.
    pub max_upload_bytes: usize,
    /// Sessions untouched for this long are dropped (`SESSION_TTL_SECS`).
    pub session_ttl: Duration,
    /// How often the idle sweep runs (`SESSION_SWEEP_SECS`).
    pub session_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            layout_measurement: parse_measurement(
                &std::env::var("LAYOUT_MEASUREMENT").unwrap_or_else(|_| "metrics".to_string()),
            )?,
            max_upload_bytes: match std::env::var("MAX_UPLOAD_BYTES") {
                Ok(v) => v
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
            },
            session_ttl: parse_secs(
                "SESSION_TTL_SECS",
                std::env::var("SESSION_TTL_SECS").ok(),
                DEFAULT_SESSION_TTL_SECS,
            )?,
            session_sweep_interval: parse_secs(
                "SESSION_SWEEP_SECS",
                std::env::var("SESSION_SWEEP_SECS").ok(),
                DEFAULT_SESSION_SWEEP_SECS,
            )?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_measurement(value: &str) -> Result<Measurement> {
    Measurement::parse(value)
        .ok_or_else(|| anyhow!("LAYOUT_MEASUREMENT must be 'metrics' or 'off', got '{value}'"))
}

/// A positive whole number of seconds, or `default` when unset.
fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<Duration> {
    let secs = match value {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
