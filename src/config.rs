use std::{env, fmt::Display, str::FromStr, time::Duration};

use reqwest::Url;
use tracing::{debug, info};

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub request_timeout: Duration,
    /// How long a removal stays undoable.
    pub undo_window: Duration,
    /// Banner lifetime for signup and removal outcomes.
    pub notice_delay: Duration,
    /// Banner lifetime once an undo attempt has resolved.
    pub undo_notice_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
            request_timeout: Duration::from_secs(10),
            undo_window: Duration::from_secs(5),
            notice_delay: Duration::from_secs(5),
            undo_notice_delay: Duration::from_secs(3),
        }
    }
}

impl Config {
    /// Reads `.env` (if any) and the `ROSTER_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = match lookup("ROSTER_API_URL") {
            Some(raw) => parse_api_url(&raw)?,
            None => {
                info!("ROSTER_API_URL not set, using default: {DEFAULT_API_URL}");
                defaults.api_url
            }
        };

        Ok(Self {
            api_url,
            request_timeout: try_secs(
                &lookup,
                "ROSTER_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout,
            )?,
            undo_window: try_secs(&lookup, "ROSTER_UNDO_WINDOW_SECS", defaults.undo_window)?,
            notice_delay: try_secs(&lookup, "ROSTER_NOTICE_SECS", defaults.notice_delay)?,
            undo_notice_delay: try_secs(
                &lookup,
                "ROSTER_UNDO_NOTICE_SECS",
                defaults.undo_notice_delay,
            )?,
        })
    }

    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(raw)?;
        Ok(self)
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

fn try_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match lookup(key) {
        Some(raw) => try_parse::<u64>(key, &raw).map(Duration::from_secs),
        None => {
            debug!("{key} not set, using default: {}s", default.as_secs());
            Ok(default)
        }
    }
}

fn try_parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}
