//! Configuration management for `yabt`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`YABT_*`)
//! 3. Project config (`./yabt.yaml`, or the file given with `--config`)
//! 4. User config (`~/.config/yabt/config.yaml`)
//! 5. Defaults
//!
//! Layers are flat key/value maps; keys are normalized to kebab-case so
//! `page_size`, `PAGE-SIZE` and `page-size` are the same key. The merged
//! layer resolves into a typed [`Settings`].

use crate::error::{Result, YabtError};
use crate::logging::LogFormat;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default database filename, relative to the working directory.
pub const DEFAULT_DB_FILENAME: &str = "yabt.db";
/// Project config filename, relative to the working directory.
pub const PROJECT_CONFIG_FILENAME: &str = "yabt.yaml";
/// Default HTTP listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_MAX_TAGS: usize = 50;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// One configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `YABT_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix("YABT_") {
                layer.insert(stripped, value);
            }
        }
        layer
    }

    pub fn insert(&mut self, key: &str, value: String) {
        self.values.insert(normalize_key(key), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize_key(key))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// CLI overrides for config loading.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub user: Option<String>,
    pub bind: Option<String>,
    pub lock_timeout: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            layer.insert("db", path.to_string_lossy().to_string());
        }
        if let Some(user) = &self.user {
            layer.insert("current-user", user.clone());
        }
        if let Some(bind) = &self.bind {
            layer.insert("bind", bind.clone());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            layer.insert("lock-timeout", lock_timeout.to_string());
        }

        layer
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db: PathBuf,
    pub bind: SocketAddr,
    /// Allow any origin (for a locally served front end).
    pub cors_permissive: bool,
    /// Acting user when a request or command does not name one.
    pub current_user: Option<String>,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub max_tags: usize,
    pub lock_timeout: Option<u64>,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db: PathBuf::from(DEFAULT_DB_FILENAME),
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cors_permissive: false,
            current_user: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            max_tags: DEFAULT_MAX_TAGS,
            lock_timeout: Some(DEFAULT_LOCK_TIMEOUT_MS),
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Resolve settings from a merged layer.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value is present but malformed.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let defaults = Self::default();

        let bind = match layer.get("bind") {
            Some(value) => value
                .parse()
                .map_err(|_| config_error("bind", value, "expected host:port"))?,
            None => defaults.bind,
        };

        let cors_permissive = match layer.get("cors-permissive") {
            Some(value) => {
                parse_bool(value).ok_or_else(|| config_error("cors-permissive", value, "expected a boolean"))?
            }
            None => defaults.cors_permissive,
        };

        let log_format = match layer.get("log-format") {
            Some(value) => match value.to_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(config_error("log-format", value, "expected text or json")),
            },
            None => defaults.log_format,
        };

        let default_page_size = parse_usize(layer, "default-page-size")?.unwrap_or(defaults.default_page_size);
        let max_page_size = parse_usize(layer, "max-page-size")?.unwrap_or(defaults.max_page_size);
        if default_page_size == 0 || max_page_size == 0 {
            return Err(YabtError::Config("page sizes must be positive".to_string()));
        }

        let lock_timeout = match layer.get("lock-timeout") {
            Some(value) => Some(
                value
                    .parse::<u64>()
                    .map_err(|_| config_error("lock-timeout", value, "expected milliseconds"))?,
            ),
            None => defaults.lock_timeout,
        };

        Ok(Self {
            db: layer
                .get("db")
                .map_or(defaults.db, PathBuf::from),
            bind,
            cors_permissive,
            current_user: layer.get("current-user").map(str::to_string),
            default_page_size: default_page_size.min(max_page_size),
            max_page_size,
            max_tags: parse_usize(layer, "max-tags")?.unwrap_or(defaults.max_tags),
            lock_timeout,
            log_format,
        })
    }
}

/// Load user config (`~/.config/yabt/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("yabt")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Load project config (explicit path, or `./yabt.yaml`).
///
/// # Errors
///
/// Returns `Config` if an explicit path does not exist, or an error if the
/// file cannot be read or parsed.
pub fn load_project_config(explicit: Option<&Path>) -> Result<ConfigLayer> {
    match explicit {
        Some(path) if !path.exists() => Err(YabtError::Config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => ConfigLayer::from_yaml(path),
        None => ConfigLayer::from_yaml(Path::new(PROJECT_CONFIG_FILENAME)),
    }
}

/// Load configuration with the full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed, or a value
/// is malformed.
pub fn load_settings(cli: &CliOverrides) -> Result<Settings> {
    let user = load_user_config()?;
    let project = load_project_config(cli.config.as_deref())?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    let merged = ConfigLayer::merge_layers(&[user, project, env_layer, cli_layer]);
    let settings = Settings::from_layer(&merged)?;
    tracing::debug!(db = %settings.db.display(), bind = %settings.bind, "Resolved settings");
    Ok(settings)
}

fn config_error(key: &str, value: &str, expected: &str) -> YabtError {
    YabtError::Config(format!("invalid value '{value}' for '{key}': {expected}"))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '.'], "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_usize(layer: &ConfigLayer, key: &str) -> Result<Option<usize>> {
    layer
        .get(key)
        .map(|value| {
            value
                .parse::<usize>()
                .map_err(|_| config_error(key, value, "expected a non-negative integer"))
        })
        .transpose()
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
