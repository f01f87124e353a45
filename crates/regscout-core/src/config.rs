//! Configuration management for regscout.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Every tunable the engines consume
//! (delays, thresholds, directories) lives here and is passed into
//! constructors explicitly, so tests can run isolated instances against
//! temporary directories.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/regscout/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data directory layout
    pub paths: PathsConfig,
    /// Search-space and retry settings
    pub search: SearchConfig,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Request pacing profiles
    pub throttle: ThrottleSettings,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `REGSCOUT_DATA_DIR`: Override the data directory
    /// - `REGSCOUT_SEARCH_URL`: Override the registry search URL
    /// - `REGSCOUT_MAX_RETRIES`: Override the per-unit retry budget
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("REGSCOUT_DATA_DIR") {
            if !val.is_empty() {
                config.paths.data_dir = Some(PathBuf::from(&val));
                tracing::debug!("Override data_dir from env: {}", val);
            }
        }

        if let Ok(val) = std::env::var("REGSCOUT_SEARCH_URL") {
            if !val.is_empty() {
                config.client.search_url = val.clone();
                tracing::debug!("Override search_url from env: {}", val);
            }
        }

        if let Ok(val) = std::env::var("REGSCOUT_MAX_RETRIES") {
            if let Ok(retries) = val.parse() {
                config.search.max_retries = retries;
                tracing::debug!("Override max_retries from env: {}", retries);
            }
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/regscout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("au", "regscout", "regscout").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Data directory layout.
///
/// All run artifacts live under one data directory:
/// `discovery/` (ID files + journal), `checkpoints/` (snapshots),
/// `extracted/` (CSV output) and `backup/` (JSONL backup).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Base data directory. `None` means the platform data dir
    /// (`~/.local/share/regscout` on Linux).
    pub data_dir: Option<PathBuf>,
}

impl PathsConfig {
    /// Build a layout rooted at an explicit directory (used by tests).
    #[must_use]
    pub fn rooted_at(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
        }
    }

    /// Resolve the base data directory.
    pub fn resolve(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let dirs =
            ProjectDirs::from("au", "regscout", "regscout").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Directory holding discovered-ID files and the raw journal.
    pub fn discovery_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.resolve()?.join("discovery"))
    }

    /// Directory holding checkpoint snapshots.
    pub fn checkpoint_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.resolve()?.join("checkpoints"))
    }

    /// Directory holding extracted CSV output.
    pub fn extracted_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.resolve()?.join("extracted"))
    }

    /// Directory holding the JSONL extraction backup.
    pub fn backup_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.resolve()?.join("backup"))
    }
}

/// Search-space and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result count at which a prefix is assumed truncated and must be
    /// expanded (the registry's page limit).
    pub page_result_limit: usize,
    /// Maximum prefix depth for recursive expansion (4 = `AAAA`).
    pub max_prefix_depth: usize,
    /// Maximum result pages to walk per search unit.
    pub pagination_limit: u32,
    /// Times a failing unit is re-enqueued before being abandoned.
    pub max_retries: u32,
    /// Fixed delay between transient-error retry attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Save the checkpoint every N newly collected items (prefix mode).
    pub checkpoint_interval: u64,
    /// Save the checkpoint at least every N seconds.
    pub auto_save_interval_secs: u64,
    /// Minimum populated fields for an extracted record to count as parsed.
    pub min_populated_fields: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_result_limit: 100,
            max_prefix_depth: 4,
            pagination_limit: 10,
            max_retries: 2,
            retry_delay_secs: 5,
            checkpoint_interval: 50,
            auto_save_interval_secs: 100,
            min_populated_fields: 2,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Registry base URL.
    pub base_url: String,
    /// Search page URL (session init target and form POST endpoint).
    pub search_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Rotate the user agent every N requests.
    pub ua_rotation_interval: u32,
    /// Desktop user agents to rotate through.
    pub user_agents: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ahpra.gov.au".to_string(),
            search_url: "https://www.ahpra.gov.au/Registration/Registers-of-Practitioners.aspx"
                .to_string(),
            timeout_secs: 30,
            ua_rotation_interval: 10,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15".to_string(),
            ],
        }
    }
}

/// Request pacing profiles.
///
/// The discovery and extraction stages observe different traffic ceilings
/// (form searches are cheaper for the remote side than detail fetches), so
/// each stage carries its own profile. Neither set of values is canonical;
/// both are deliberately configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleSettings {
    /// Pacing for the discovery stage.
    pub discovery: ThrottleProfile,
    /// Pacing for the extraction stage.
    pub extraction: ThrottleProfile,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self::stage_defaults()
    }
}

/// One pacing profile: per-request delay shaping plus the two cooldown tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleProfile {
    /// Base inter-request delay in seconds.
    pub base_delay_secs: f64,
    /// Extra delay added per consecutive failure, in seconds.
    pub failure_increment_secs: f64,
    /// Uniform jitter bound in seconds (delay varies by ±jitter).
    pub jitter_secs: f64,
    /// Hard lower bound on the delay regardless of jitter, in seconds.
    pub floor_secs: f64,
    /// Failures within the current window before the short cooldown fires.
    pub short_cooldown_threshold: u32,
    /// Short cooldown duration in seconds.
    pub short_cooldown_secs: u64,
    /// Consecutive failures before the long cooldown fires.
    pub long_cooldown_threshold: u32,
    /// Long cooldown duration in seconds.
    pub long_cooldown_secs: u64,
}

impl Default for ThrottleProfile {
    fn default() -> Self {
        Self::discovery_defaults()
    }
}

impl ThrottleProfile {
    /// Defaults for the discovery stage (short per-search pacing).
    #[must_use]
    pub fn discovery_defaults() -> Self {
        Self {
            base_delay_secs: 1.5,
            failure_increment_secs: 5.0,
            jitter_secs: 0.7,
            floor_secs: 0.8,
            short_cooldown_threshold: 3,
            short_cooldown_secs: 60,
            long_cooldown_threshold: 3,
            long_cooldown_secs: 300,
        }
    }

    /// Defaults for the extraction stage. Detail fetches are what the
    /// remote defense rate-counts, so the base delay is much larger.
    #[must_use]
    pub fn extraction_defaults() -> Self {
        Self {
            base_delay_secs: 15.0,
            failure_increment_secs: 5.0,
            jitter_secs: 2.0,
            floor_secs: 13.0,
            short_cooldown_threshold: 3,
            short_cooldown_secs: 60,
            long_cooldown_threshold: 3,
            long_cooldown_secs: 300,
        }
    }
}

impl ThrottleSettings {
    /// Profiles with the stage-appropriate defaults filled in.
    #[must_use]
    pub fn stage_defaults() -> Self {
        Self {
            discovery: ThrottleProfile::discovery_defaults(),
            extraction: ThrottleProfile::extraction_defaults(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.search.page_result_limit, 100);
        assert_eq!(config.search.max_prefix_depth, 4);
        assert_eq!(config.search.max_retries, 2);
        assert_eq!(config.client.timeout_secs, 30);
        assert!(!config.client.user_agents.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[search]"));
        assert!(toml_str.contains("[client]"));
        assert!(toml_str.contains("[throttle.discovery]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.search.page_result_limit, config.search.page_result_limit);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.search.max_retries = 5;
        config.throttle.extraction.base_delay_secs = 20.0;

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert_eq!(loaded.search.max_retries, 5);
        assert!((loaded.throttle.extraction.base_delay_secs - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_config() {
        // Partial TOML configs fill the rest with defaults
        let toml_str = r#"
[search]
max_prefix_depth = 2

[throttle.extraction]
base_delay_secs = 30.0
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.search.max_prefix_depth, 2);
        assert!((config.throttle.extraction.base_delay_secs - 30.0).abs() < f64::EPSILON);
        // These should be defaults
        assert_eq!(config.search.page_result_limit, 100);
        assert_eq!(config.search.pagination_limit, 10);
    }

    #[test]
    fn test_paths_rooted_at() {
        let tmp = TempDir::new().expect("create temp dir");
        let paths = PathsConfig::rooted_at(tmp.path());

        let discovery = paths.discovery_dir().expect("discovery dir");
        assert!(discovery.starts_with(tmp.path()));
        assert!(discovery.ends_with("discovery"));

        let checkpoints = paths.checkpoint_dir().expect("checkpoint dir");
        assert!(checkpoints.ends_with("checkpoints"));
    }

    #[test]
    fn test_stage_throttle_defaults() {
        let settings = ThrottleSettings::stage_defaults();
        // Extraction paces far slower than discovery
        assert!(settings.extraction.base_delay_secs > settings.discovery.base_delay_secs);
        assert!(settings.extraction.floor_secs > settings.discovery.floor_secs);
        assert_eq!(settings.extraction.long_cooldown_secs, 300);
    }
}
