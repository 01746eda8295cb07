use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use updctl_engine::{ClientSettings, EngineSettings, DEFAULT_BASE_URL};

use crate::cli::GlobalArgs;

pub(crate) const CONFIG_FILENAME: &str = "updctl.ron";
const ENV_BASE_URL: &str = "UPDCTL_BASE_URL";
const ENV_POLL_INTERVAL: &str = "UPDCTL_POLL_INTERVAL_MS";
const MIN_POLL_INTERVAL_MS: u64 = 250;

/// Client configuration as stored in `updctl.ron`.
///
/// Resolution order, last wins: defaults, file, environment, command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) poll_interval_ms: u64,
    /// Falls back to the poll interval.
    pub(crate) request_timeout_ms: Option<u64>,
    pub(crate) connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 3000,
            request_timeout_ms: None,
            connect_timeout_ms: 2000,
        }
    }
}

impl ClientConfig {
    pub(crate) fn resolve(global: &GlobalArgs) -> Self {
        let path = global
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
        let mut config = Self::load_file(&path);
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(global.base_url.as_deref(), global.interval_ms);
        config
    }

    /// Missing file yields defaults; an unreadable or invalid one is logged
    /// and ignored.
    pub(crate) fn load_file(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                engine_warn!("Failed to read config from {:?}: {}", path, err);
                return Self::default();
            }
        };

        match ron::from_str::<ClientConfig>(&content) {
            Ok(config) => {
                engine_info!("Loaded config from {:?}", path);
                config
            }
            Err(err) => {
                engine_warn!("Failed to parse config from {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|url| !url.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.poll_interval_ms = ms,
                Err(err) => engine_warn!("Ignoring {}={:?}: {}", ENV_POLL_INTERVAL, raw, err),
            }
        }
    }

    pub(crate) fn apply_overrides(&mut self, base_url: Option<&str>, interval_ms: Option<u64>) {
        if let Some(url) = base_url {
            self.base_url = url.trim().to_string();
        }
        if let Some(ms) = interval_ms {
            self.poll_interval_ms = ms;
        }
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        self.request_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.poll_interval())
    }

    /// Upper bound for a one-shot command to wait on a response.
    pub(crate) fn response_deadline(&self) -> Duration {
        self.request_timeout()
            + Duration::from_millis(self.connect_timeout_ms)
            + Duration::from_secs(1)
    }

    pub(crate) fn engine_settings(&self, progress_polling: bool) -> EngineSettings {
        EngineSettings {
            client: ClientSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: self.request_timeout(),
            },
            poll_interval: self.poll_interval(),
            progress_polling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_file(&dir.path().join(CONFIG_FILENAME));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(base_url: "http://backend:9000/api/stocks", request_timeout_ms: Some(5000))"#,
        )
        .unwrap();

        let config = ClientConfig::load_file(&path);
        assert_eq!(config.base_url, "http://backend:9000/api/stocks");
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn invalid_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "base_url = 'toml is not ron'").unwrap();
        assert_eq!(ClientConfig::load_file(&path), ClientConfig::default());
    }

    #[test]
    fn cli_beats_environment_beats_file() {
        let mut config = ClientConfig {
            base_url: "http://from-file".to_string(),
            poll_interval_ms: 1000,
            ..ClientConfig::default()
        };
        config.apply_env(|key| match key {
            ENV_BASE_URL => Some("http://from-env".to_string()),
            ENV_POLL_INTERVAL => Some("not a number".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "http://from-env");
        assert_eq!(config.poll_interval_ms, 1000);

        config.apply_overrides(Some(" http://from-cli "), Some(500));
        assert_eq!(config.base_url, "http://from-cli");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn tiny_intervals_are_clamped() {
        let config = ClientConfig {
            poll_interval_ms: 0,
            ..ClientConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        let settings = config.engine_settings(true);
        assert_eq!(settings.client.request_timeout, Duration::from_millis(250));
    }
}
