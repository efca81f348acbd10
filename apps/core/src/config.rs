use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "leetjump";
const CONFIG_FILE_NAME: &str = "config.json";
const CATALOG_FILE_NAME: &str = "catalog.sqlite3";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_results: u16,
    pub freshness_window_hours: u32,
    pub sync_check_interval_minutes: u32,
    pub provider_endpoint: String,
    pub problem_url_base: String,
    pub daily_problem_url: String,
    pub catalog_db_path: PathBuf,
    pub log_level: String,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            max_results: 50,
            freshness_window_hours: 24,
            sync_check_interval_minutes: 360,
            provider_endpoint: "https://leetcode.com/api/problems/all/".to_string(),
            problem_url_base: "https://leetcode.com/problems/".to_string(),
            daily_problem_url: "https://leetcode.com/problemset/".to_string(),
            catalog_db_path: base.join(CATALOG_FILE_NAME),
            log_level: "info".to_string(),
            config_path: base.join(CONFIG_FILE_NAME),
        }
    }
}

impl Config {
    pub fn freshness_window(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.freshness_window_hours))
    }

    pub fn sync_check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.sync_check_interval_minutes) * 60)
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    stable_app_data_dir().join(CONFIG_FILE_NAME)
}

/// Loads the config at `path` (or the default location). A missing file
/// yields defaults; `.toml` files are read as TOML, anything else as JSON5.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !config_path.exists() {
        let cfg = Config {
            config_path,
            ..Config::default()
        };
        validate(&cfg)?;
        return Ok(cfg);
    }

    let raw = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    let mut cfg: Config = if is_toml(&config_path) {
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: config_path.clone(),
            message: e.to_string(),
        })?
    } else {
        json5::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: config_path.clone(),
            message: e.to_string(),
        })?
    };
    cfg.config_path = config_path;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    let encoded = if is_toml(&cfg.config_path) {
        toml::to_string_pretty(cfg).map_err(|e| ConfigError::Serialize(e.to_string()))?
    } else {
        serde_json::to_string_pretty(cfg).map_err(|e| ConfigError::Serialize(e.to_string()))?
    };

    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&cfg.config_path, encoded).map_err(|source| ConfigError::Io {
        path: cfg.config_path.clone(),
        source,
    })
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.max_results == 0 || cfg.max_results > 500 {
        return Err(ConfigError::Invalid("max_results out of range".into()));
    }
    if cfg.freshness_window_hours == 0 {
        return Err(ConfigError::Invalid(
            "freshness_window_hours must be positive".into(),
        ));
    }
    if cfg.sync_check_interval_minutes == 0 {
        return Err(ConfigError::Invalid(
            "sync_check_interval_minutes must be positive".into(),
        ));
    }
    if cfg.provider_endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid("provider_endpoint is required".into()));
    }
    if cfg.problem_url_base.trim().is_empty() {
        return Err(ConfigError::Invalid("problem_url_base is required".into()));
    }
    if cfg.catalog_db_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("catalog_db_path is required".into()));
    }
    Ok(())
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
