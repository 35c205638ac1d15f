//! Configuration for the sidebar client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{SidebarError, SidebarResult};

/// Environment variable holding the thread-store base URL.
pub const API_URL_ENV: &str = "SIDEBAR_API_URL";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "SIDEBAR_TIMEOUT_SECS";
/// Environment variable enabling placeholder threads on refresh failure.
pub const PLACEHOLDER_ENV: &str = "SIDEBAR_PLACEHOLDER_ON_ERROR";

/// Default thread-store base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Configuration for the sidebar client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SidebarConfig {
    /// Base URL of the thread store (the `/api/thread` routes hang off it).
    pub api_url: String,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Replace the list with placeholder threads when a refresh fails.
    pub placeholder_on_error: bool,
    /// Title derivation rules.
    pub titles: TitleRules,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            placeholder_on_error: false,
            titles: TitleRules::default(),
        }
    }
}

impl SidebarConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the environment, falling back to defaults.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed, or if the
    /// resulting config is invalid.
    pub fn from_env() -> SidebarResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api_url = url;
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                SidebarError::Config(format!("{TIMEOUT_ENV} must be a number of seconds: {e}"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var(PLACEHOLDER_ENV) {
            config.placeholder_on_error = parse_flag(&raw).ok_or_else(|| {
                SidebarError::Config(format!("{PLACEHOLDER_ENV} must be true or false, got {raw:?}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the thread-store base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable placeholder threads on refresh failure.
    #[must_use]
    pub const fn with_placeholder_on_error(mut self, enabled: bool) -> Self {
        self.placeholder_on_error = enabled;
        self
    }

    /// Replace the title rules.
    #[must_use]
    pub fn with_titles(mut self, titles: TitleRules) -> Self {
        self.titles = titles;
        self
    }

    /// Parsed base URL.
    ///
    /// # Errors
    /// Returns an error if `api_url` is not an absolute http(s) URL.
    pub fn base_url(&self) -> SidebarResult<Url> {
        let url = Url::parse(self.api_url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SidebarError::Config(format!(
                "api_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if url.cannot_be_a_base() {
            return Err(SidebarError::Config(format!(
                "api_url cannot be used as a base: {url}"
            )));
        }
        Ok(url)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> SidebarResult<()> {
        self.base_url()?;

        if self.request_timeout.is_zero() {
            return Err(SidebarError::Config(
                "request_timeout must be > 0".to_string(),
            ));
        }

        self.titles.validate()
    }
}

/// Rules for turning a chat record into a display title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRules {
    /// Longest text kept without truncation (characters).
    pub max_len: usize,
    /// Characters kept before the ellipsis when text is truncated.
    pub cut_len: usize,
    /// A leading clause must be longer than this to be used on its own.
    pub min_clause_len: usize,
    /// Characters of the thread id used by the `Chat <id>` fallback.
    pub id_prefix_len: usize,
    /// Appended to truncated text.
    pub ellipsis: String,
    /// Prepended to titles taken from an assistant response.
    pub response_prefix: String,
    /// Title of a thread with nothing to derive a title from.
    pub fallback: String,
}

impl Default for TitleRules {
    fn default() -> Self {
        Self {
            max_len: 28,
            cut_len: 25,
            min_clause_len: 5,
            id_prefix_len: 8,
            ellipsis: "...".to_string(),
            response_prefix: "AI: ".to_string(),
            fallback: "New Chat".to_string(),
        }
    }
}

impl TitleRules {
    /// Validate the rules.
    ///
    /// # Errors
    /// Returns an error if lengths are zero or inconsistent.
    pub fn validate(&self) -> SidebarResult<()> {
        if self.max_len == 0 || self.cut_len == 0 {
            return Err(SidebarError::Config(
                "titles.max_len and titles.cut_len must be > 0".to_string(),
            ));
        }
        if self.cut_len > self.max_len {
            return Err(SidebarError::Config(format!(
                "titles.cut_len ({}) must not exceed titles.max_len ({})",
                self.cut_len, self.max_len
            )));
        }
        if self.id_prefix_len == 0 {
            return Err(SidebarError::Config(
                "titles.id_prefix_len must be > 0".to_string(),
            ));
        }
        if self.fallback.trim().is_empty() {
            return Err(SidebarError::Config(
                "titles.fallback must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a boolean environment flag.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SidebarConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(!config.placeholder_on_error);
        assert_eq!(config.titles.max_len, 28);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SidebarConfig::new()
            .with_api_url("https://chat.example.com/")
            .with_timeout(Duration::from_secs(60))
            .with_placeholder_on_error(true);

        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.placeholder_on_error);
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://chat.example.com/"
        );
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(SidebarConfig::new().with_api_url("not a url").validate().is_err());
        assert!(SidebarConfig::new().with_api_url("ftp://host").validate().is_err());
        assert!(SidebarConfig::new().with_api_url("mailto:a@b.c").validate().is_err());
    }

    #[test]
    fn test_rejects_inconsistent_titles() {
        let titles = TitleRules {
            cut_len: 40,
            ..TitleRules::default()
        };
        assert!(SidebarConfig::new().with_titles(titles).validate().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_serde_round_trip_durations_as_seconds() {
        let config = SidebarConfig::default();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["request_timeout"], serde_json::json!(15));
        let back: SidebarConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }
}
