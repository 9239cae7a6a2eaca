//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/linkkeep/config.toml)
//! 3. Environment variables (LINKKEEP_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "LINKKEEP";

/// Backups kept when the config does not say
pub const DEFAULT_MAX_BACKUPS: usize = 30;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (link file, backups, exports)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Number of backups to keep; 0 keeps all
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Log file used when LINKKEEP_LOG is set
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_backups: DEFAULT_MAX_BACKUPS,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (LINKKEEP_DATA_DIR, LINKKEEP_MAX_BACKUPS, LINKKEEP_LOG_FILE)
    /// 2. Config file (~/.config/linkkeep/config.toml or LINKKEEP_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a config file given on the command line
    pub fn load_with_cli_override(config_path: Option<&PathBuf>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // LINKKEEP_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // LINKKEEP_MAX_BACKUPS
        if let Ok(val) = std::env::var(format!("{}_MAX_BACKUPS", ENV_PREFIX)) {
            self.max_backups = val
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}_MAX_BACKUPS: {:?}", ENV_PREFIX, val))?;
        }

        // LINKKEEP_LOG_FILE
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with LINKKEEP_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("linkkeep")
            .join("config.toml")
    }

    /// Get the path to the link file
    pub fn links_path(&self) -> PathBuf {
        self.data_dir.join("links.json")
    }

    /// Get the backup directory
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// Default destination for CSV exports
    pub fn default_export_path(&self) -> PathBuf {
        self.data_dir.join("links_export.csv")
    }

    /// Get the log file path, falling back to `debug.log` in the data directory
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("linkkeep")
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "LINKKEEP_DATA_DIR",
        "LINKKEEP_MAX_BACKUPS",
        "LINKKEEP_LOG_FILE",
        "LINKKEEP_CONFIG",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_backups, 30);
        assert!(config.log_file.is_none());
        assert!(config.data_dir.ends_with("linkkeep"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            data_dir: PathBuf::from("/data/linkkeep"),
            ..Config::default()
        };

        assert_eq!(config.links_path(), PathBuf::from("/data/linkkeep/links.json"));
        assert_eq!(config.backup_dir(), PathBuf::from("/data/linkkeep/backups"));
        assert_eq!(
            config.default_export_path(),
            PathBuf::from("/data/linkkeep/links_export.csv")
        );
        assert_eq!(config.log_path(), PathBuf::from("/data/linkkeep/debug.log"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("LINKKEEP_DATA_DIR", "/tmp/linkkeep-test");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/linkkeep-test"));
    }

    #[test]
    fn test_env_override_max_backups() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("LINKKEEP_MAX_BACKUPS", "5");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.max_backups, 5);

        env::set_var("LINKKEEP_MAX_BACKUPS", "many");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_env_override_log_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("LINKKEEP_LOG_FILE", "/tmp/linkkeep.log");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.log_path(), PathBuf::from("/tmp/linkkeep.log"));

        // Empty string clears it
        env::set_var("LINKKEEP_LOG_FILE", "");
        config.apply_env_overrides().unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_serialization() {
        let config = Config {
            data_dir: PathBuf::from("/data/linkkeep"),
            max_backups: 7,
            log_file: Some(PathBuf::from("/var/log/linkkeep.log")),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("max_backups"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.max_backups, 7);
        assert_eq!(parsed.log_file, config.log_file);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            max_backups = 0
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.max_backups, 0);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        env::set_var("LINKKEEP_DATA_DIR", temp_dir.path().join("data"));

        let config = Config::load_from_path(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.max_backups, DEFAULT_MAX_BACKUPS);
        assert!(config.data_dir.exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            max_backups: 3,
            log_file: None,
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.max_backups, 3);
    }
}
