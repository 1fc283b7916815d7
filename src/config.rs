use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub body_limit_bytes: usize,
    pub image_limit_bytes: usize,
    pub model_dir: PathBuf,
    pub data_dir: PathBuf,
    pub outbound_timeout: Duration,
    pub search_url: String,
    pub artifact_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.into());

        let port = parse(
            "PORT",
            var("PORT", "8080"),
            "a valid number between 0 and 65535",
        )?;
        let body_limit_mb: usize = parse("BODY_LIMIT_MB", var("BODY_LIMIT_MB", "5"), "a valid integer")?;
        let image_limit_mb: usize =
            parse("IMAGE_LIMIT_MB", var("IMAGE_LIMIT_MB", "20"), "a valid integer")?;
        let timeout_secs: u64 = parse(
            "OUTBOUND_TIMEOUT_SECS",
            var("OUTBOUND_TIMEOUT_SECS", "10"),
            "a whole number of seconds",
        )?;

        Ok(Config {
            port,
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            image_limit_bytes: image_limit_mb * 1024 * 1024,
            model_dir: PathBuf::from(var("MODEL_DIR", "./model")),
            data_dir: PathBuf::from(var("DATA_DIR", "./dataset")),
            outbound_timeout: Duration::from_secs(timeout_secs),
            search_url: var("NUTRITION_SEARCH_URL", DEFAULT_SEARCH_URL),
            artifact_base_url: lookup("ARTIFACT_BASE_URL").filter(|url| !url.trim().is_empty()),
        })
    }
}

fn parse<T: std::str::FromStr>(
    name: &'static str,
    value: String,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        })
}
