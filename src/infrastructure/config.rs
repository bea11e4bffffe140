use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::application::WorkflowSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Client configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend API root, without the `ArchiveRequests` segment
    pub api_url: String,
    pub page_size: u32,
    pub today_page_size: u32,
    pub search_debounce: Duration,
    pub http_timeout: Duration,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("ARCHIVE_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("ARCHIVE_API_URL"))?;

        let page_size = parse_or(&lookup, "ARCHIVE_PAGE_SIZE", 10u32)?;
        let today_page_size = parse_or(&lookup, "ARCHIVE_TODAY_PAGE_SIZE", 100u32)?;
        for (var, value) in [
            ("ARCHIVE_PAGE_SIZE", page_size),
            ("ARCHIVE_TODAY_PAGE_SIZE", today_page_size),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    var,
                    value: value.to_string(),
                });
            }
        }

        Ok(Self {
            api_url,
            page_size,
            today_page_size,
            search_debounce: Duration::from_millis(parse_or(
                &lookup,
                "ARCHIVE_SEARCH_DEBOUNCE_MS",
                300u64,
            )?),
            http_timeout: Duration::from_secs(parse_or(&lookup, "ARCHIVE_HTTP_TIMEOUT_SECS", 30u64)?),
            log_file: lookup("ARCHIVE_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("plate-archive.log")),
        })
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            page_size: self.page_size,
            today_page_size: self.today_page_size,
            search_debounce: self.search_debounce,
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("ARCHIVE_API_URL", "http://localhost:5000/api")]).unwrap();
        assert_eq!(config.api_url, "http://localhost:5000/api");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.today_page_size, 100);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.log_file, PathBuf::from("plate-archive.log"));
    }

    #[test]
    fn test_missing_api_url() {
        assert_eq!(config_from(&[]), Err(ConfigError::Missing("ARCHIVE_API_URL")));
        assert_eq!(
            config_from(&[("ARCHIVE_API_URL", "  ")]),
            Err(ConfigError::Missing("ARCHIVE_API_URL"))
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("ARCHIVE_API_URL", "https://archive.local"),
            ("ARCHIVE_PAGE_SIZE", "25"),
            ("ARCHIVE_SEARCH_DEBOUNCE_MS", "150"),
            ("ARCHIVE_LOG_FILE", "/tmp/archive.log"),
        ])
        .unwrap();

        let settings = config.workflow_settings();
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.today_page_size, 100);
        assert_eq!(settings.search_debounce, Duration::from_millis(150));
        assert_eq!(config.log_file, PathBuf::from("/tmp/archive.log"));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            config_from(&[("ARCHIVE_API_URL", "x"), ("ARCHIVE_PAGE_SIZE", "ten")]),
            Err(ConfigError::Invalid {
                var: "ARCHIVE_PAGE_SIZE",
                value: "ten".to_string()
            })
        );
        assert!(matches!(
            config_from(&[("ARCHIVE_API_URL", "x"), ("ARCHIVE_TODAY_PAGE_SIZE", "0")]),
            Err(ConfigError::Invalid { var: "ARCHIVE_TODAY_PAGE_SIZE", .. })
        ));
    }
}
