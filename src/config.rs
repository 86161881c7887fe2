//! Runtime configuration from the environment (and `.env` via dotenvy).

use crate::consts::limits;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found!")] Missing(&'static str),
    #[error("{key} has invalid value {value:?}")] Invalid { key: &'static str, value: String },
}

/// Where feed items come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// rss2json converts the feed to JSON for us
    Rss2Json,
    /// Fetch the XML and parse it locally
    Direct,
}

impl FromStr for FeedMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rss2json" => Ok(FeedMode::Rss2Json),
            "direct" => Ok(FeedMode::Direct),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// When set, every other chat is ignored
    pub owner: Option<i64>,
    pub data_path: PathBuf,
    pub feed_mode: FeedMode,
    pub rss2json_url: String,
    pub translate_url: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;
        let owner = parse_opt(get("MUSAID_OWNER_ID"), "MUSAID_OWNER_ID")?;
        let feed_mode = parse_opt(get("MUSAID_FEED_MODE"), "MUSAID_FEED_MODE")?.unwrap_or(FeedMode::Rss2Json);
        let timeout_secs: u64 = parse_opt(get("MUSAID_TIMEOUT_SECS"), "MUSAID_TIMEOUT_SECS")?
            .unwrap_or(limits::REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid { key: "MUSAID_TIMEOUT_SECS", value: "0".into() });
        }

        Ok(Self {
            token,
            owner,
            data_path: get("MUSAID_DATA_PATH").unwrap_or_else(|| "musaid.json".into()).into(),
            feed_mode,
            rss2json_url: get("MUSAID_RSS2JSON_URL").unwrap_or_else(|| "https://api.rss2json.com".into()),
            translate_url: get("MUSAID_TRANSLATE_URL").unwrap_or_else(|| "https://translate.googleapis.com".into()),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_opt<T: FromStr>(raw: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    raw.map(|value| value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }))
        .transpose()
}
