use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

/// Where the knive backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root of the JSON API (channels, episodes, config).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Root of the REST data proxy used to create channels.
    #[serde(default = "default_data_url")]
    pub data_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// What happens to open show tabs when the show list is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    /// Open contexts keep the record they were created with.
    #[default]
    Keep,
    /// Changed records refresh their context; vanished shows are closed.
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub reload_policy: ReloadPolicy,
    /// Quality labels appended after the built-in WiFi/HSDPA/EDGE/Audio set.
    #[serde(default)]
    pub extra_qualities: Vec<String>,
    /// Upper bound on simultaneously open show tabs.
    #[serde(default = "default_max_tabs")]
    pub max_tabs: usize,
    /// Default tracing filter; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            data_url: default_data_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            reload_policy: ReloadPolicy::default(),
            extra_qualities: Vec::new(),
            max_tabs: default_max_tabs(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:9001/apiV1".to_string()
}

fn default_data_url() -> String {
    "http://127.0.0.1:9001/data".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_tabs() -> usize {
    16
}

fn default_log_filter() -> String {
    "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string()
}

impl Config {
    /// Load the user config, writing the defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:9001/apiV1");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.console.reload_policy, ReloadPolicy::Keep);
        assert_eq!(config.console.max_tabs, 16);
        assert!(config.console.extra_qualities.is_empty());
        assert!(Config::config_path().ends_with("knive/config.toml"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [console]
            reload_policy = "refresh"
            extra_qualities = ["UMTS"]
            "#,
        )
        .unwrap();
        assert_eq!(config.console.reload_policy, ReloadPolicy::Refresh);
        assert_eq!(config.console.extra_qualities, vec!["UMTS".to_string()]);
        assert_eq!(config.console.max_tabs, 16);
        assert_eq!(config.api.data_url, "http://127.0.0.1:9001/data");
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.api.timeout_secs, 10);

        let mut edited = config.clone();
        edited.api.base_url = "http://studio.local:9001/apiV1".to_string();
        edited.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.api.base_url, "http://studio.local:9001/apiV1");
    }
}
