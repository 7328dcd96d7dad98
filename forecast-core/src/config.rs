use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::aggregate::CurrentPolicy;

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_location = "Melbourne,AU"
/// cache_ttl_secs = 600
/// current_policy = "first"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Location used when none is given on the command line.
    pub default_location: Option<String>,

    /// Override for the OpenWeather base URL.
    pub base_url: Option<String>,

    /// How long a fetched forecast is reused for the same query.
    pub cache_ttl_secs: u64,

    pub current_policy: CurrentPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_location: None,
            base_url: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            current_policy: CurrentPolicy::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast-dashboard", "forecast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from `OPENWEATHER_API_KEY`, falling back to the stored one.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env: Option<String>) -> Option<String> {
        env.filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn set_default_location(&mut self, location: String) {
        let trimmed = location.trim();
        self.default_location = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// Location given on the command line, or the configured default.
    pub fn resolve_location(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .filter(|place| !place.trim().is_empty())
            .or_else(|| self.default_location.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No location given and no default location configured.\n\
                     Hint: pass a location (e.g. `forecast show Melbourne,AU`) or run `forecast configure`."
                )
            })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();

        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
        assert_eq!(cfg.current_policy, CurrentPolicy::First);
    }

    #[test]
    fn load_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("nope.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_default_location("  Melbourne,AU ".into());
        cfg.current_policy = CurrentPolicy::Nearest;
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.default_location.as_deref(), Some("Melbourne,AU"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "current_policy = \"nearest\"\n").expect("write");

        let cfg = Config::load_from(&path).expect("load");
        assert_eq!(cfg.current_policy, CurrentPolicy::Nearest);
        assert_eq!(cfg.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
    }

    #[test]
    fn malformed_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "cache_ttl_secs = \"soon\"\n").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn env_api_key_takes_precedence() {
        let mut cfg = Config::default();
        cfg.set_api_key("STORED".into());

        assert_eq!(cfg.api_key_with_env(Some("ENV".into())).as_deref(), Some("ENV"));
        assert_eq!(cfg.api_key_with_env(Some("  ".into())).as_deref(), Some("STORED"));
        assert_eq!(cfg.api_key_with_env(None).as_deref(), Some("STORED"));
        assert_eq!(Config::default().api_key_with_env(None), None);
    }

    #[test]
    fn resolve_location_prefers_explicit() {
        let mut cfg = Config::default();
        cfg.set_default_location("Oslo".into());

        assert_eq!(cfg.resolve_location(Some("Paris".into())).expect("explicit"), "Paris");
        assert_eq!(cfg.resolve_location(None).expect("default"), "Oslo");
        assert_eq!(cfg.resolve_location(Some(" ".into())).expect("default"), "Oslo");
    }

    #[test]
    fn resolve_location_errors_without_default() {
        let err = Config::default().resolve_location(None).unwrap_err();
        assert!(err.to_string().contains("No location given"));
        assert!(err.to_string().contains("Hint: pass a location"));
    }
}
