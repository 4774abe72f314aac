use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    #[validate(url)]
    pub api_base_url: String,
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 100, max = 60000))]
    pub poll_interval_ms: u64,
    #[serde(default = "default_toast_duration_ms")]
    #[validate(range(min = 500, max = 60000))]
    pub toast_duration_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 120))]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_public_route_prefixes")]
    pub public_route_prefixes: String,
    #[serde(default = "default_initial_route")]
    pub initial_route: String,
}

fn default_api_base_url() -> String { "http://localhost:8000".into() }
fn default_poll_interval_ms() -> u64 { 1200 }
fn default_toast_duration_ms() -> u64 { 5000 }
fn default_request_timeout_secs() -> u64 { 10 }
fn default_public_route_prefixes() -> String { "/public,/forms/external".into() }
fn default_initial_route() -> String { "/dashboard".into() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            toast_duration_ms: default_toast_duration_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            data_dir: None,
            public_route_prefixes: default_public_route_prefixes(),
            initial_route: default_initial_route(),
        }
    }
}

impl AppConfig {
    /// Loads `deskline-notify.toml` (optional) then `DESKLINE_NOTIFY_*`
    /// environment variables. Invalid values fall back to the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("deskline-notify").required(false))
            .add_source(
                config::Environment::with_prefix("DESKLINE_NOTIFY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded = match config.try_deserialize::<Self>() {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, "configuration unreadable, using defaults");
                return Ok(Self::default());
            }
        };

        if let Err(e) = loaded.validate() {
            tracing::warn!(error = %e, "configuration invalid, using defaults");
            return Ok(Self::default());
        }

        Ok(loaded)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn public_prefixes(&self) -> Vec<String> {
        self.public_route_prefixes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn log_summary(&self) {
        tracing::info!(
            api_base_url = %self.api_base_url,
            poll_interval_ms = self.poll_interval_ms,
            toast_duration_ms = self.toast_duration_ms,
            request_timeout_secs = self.request_timeout_secs,
            data_dir = self.data_dir.as_ref().map(|d| d.display().to_string()).unwrap_or_else(|| "(platform default)".into()),
            public_route_prefixes = %self.public_route_prefixes,
            "configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_sync_contract() {
        let config = AppConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(1200));
        assert_eq!(config.toast_duration(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn public_prefixes_are_trimmed() {
        let config = AppConfig {
            public_route_prefixes: " /public , ,/survey".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.public_prefixes(), vec!["/public", "/survey"]);
    }

    #[test]
    fn out_of_range_interval_is_rejected() {
        let config = AppConfig {
            poll_interval_ms: 5,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_url_is_rejected() {
        let config = AppConfig {
            api_base_url: "not a url".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
