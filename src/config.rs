//! Source-list configuration.
//!
//! The scheduler that invokes newsdesk knows nothing about feeds; the list of
//! (feed URL, publisher name) pairs lives in a TOML file:
//!
//! ```toml
//! [[sources]]
//! url = "https://says.com/my/rss"
//! publisher = "SAYS"
//!
//! [[sources]]
//! url = "https://www.hmetro.com.my/feed"
//! publisher = "Harian Metro"
//! language = "BM"
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Language assigned to a publisher created without an explicit override.
pub const DEFAULT_LANGUAGE: &str = "EN";

/// Upper bound on config file size; anything larger is misconfiguration.
const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid source entry: {0}")]
    InvalidSource(String),
}

/// One feed to ingest: where to fetch it and who publishes it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub url: String,
    pub publisher: String,
    /// Language code stored when this source's publisher is first created.
    /// Falls back to [`default_language`] when unset.
    #[serde(default)]
    pub language: Option<String>,
}

/// Top-level configuration file contents.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: Vec<FeedSource>,
}

impl Config {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unreadable files, invalid TOML, or source
    /// entries with a blank url or publisher. An empty source list is legal
    /// but logged, since an ingestion run over it is a no-op.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{} bytes (max {})",
                metadata.len(),
                MAX_CONFIG_SIZE
            )));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        for source in &config.sources {
            if source.url.trim().is_empty() {
                return Err(ConfigError::InvalidSource(format!(
                    "source for publisher {:?} has an empty url",
                    source.publisher
                )));
            }
            if source.publisher.trim().is_empty() {
                return Err(ConfigError::InvalidSource(format!(
                    "source {:?} has an empty publisher",
                    source.url
                )));
            }
        }

        if config.sources.is_empty() {
            tracing::warn!(path = %path.display(), "Config contains no feed sources");
        }

        Ok(config)
    }
}

/// Language lookup for publishers created without a per-source override.
///
/// Harian Metro publishes in Malay; everyone else observed so far is English.
/// Consulted once, at publisher creation; an existing publisher's language is
/// never rewritten.
pub fn default_language(publisher: &str) -> &'static str {
    match publisher {
        "Harian Metro" => "BM",
        _ => DEFAULT_LANGUAGE,
    }
}
