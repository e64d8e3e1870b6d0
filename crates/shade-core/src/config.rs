//! Configuration types and parsing.
//!
//! The schema covers logging verbosity and the knobs of the stylesheet
//! host. The engine itself takes no configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use toml::Table;

use crate::error::{Error, Result};
use crate::logging::{LogLevel, VALID_LOG_LEVELS};

/// Embedded default configuration TOML, compiled into the binary.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config.toml");

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path where config was found, if any.
    pub source: Option<PathBuf>,
    /// Whether defaults were used (no config file found).
    pub used_defaults: bool,
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Diagnostic verbosity: one of [`VALID_LOG_LEVELS`].
    pub log_level: String,

    /// Declaration rewriting options.
    pub rewrite: RewriteConfig,

    /// `$variable` substitution options.
    pub variables: VariablesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default().to_string(),
            rewrite: RewriteConfig::default(),
            variables: VariablesConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the embedded default TOML string.
    pub fn from_default_toml() -> Result<Self> {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, merging with embedded defaults.
    ///
    /// Returns an error if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_with_defaults(&content)
    }

    /// Parse both the default and user config as TOML tables, deep-merge
    /// them (user values win), then deserialize the result.
    pub fn load_with_defaults(user_toml: &str) -> Result<Self> {
        let mut base: Table = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let user: Table = toml::from_str(user_toml)?;

        deep_merge_toml(&mut base, user);

        let config: Config = base.try_into()?;
        Ok(config)
    }

    /// Find and load configuration.
    ///
    /// An explicit path is used strictly (no fallback). Otherwise the
    /// [`config_search_paths`](Self::config_search_paths) are tried in
    /// order; a file that exists but fails to load is an error, and the
    /// embedded defaults are used only when no file exists at all.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<ConfigLoadResult> {
        if let Some(path) = explicit_path {
            let config = Self::load(path)?;
            return Ok(ConfigLoadResult {
                config,
                source: Some(path.to_path_buf()),
                used_defaults: false,
            });
        }

        let search_paths = Self::config_search_paths();

        if let Some(path) = search_paths.iter().find(|path| path.exists()) {
            return match Self::load(path) {
                Ok(config) => Ok(ConfigLoadResult {
                    config,
                    source: Some(path.clone()),
                    used_defaults: false,
                }),
                Err(e) => {
                    tracing::error!("Config file {:?} exists but failed to load: {}", path, e);
                    Err(e)
                }
            };
        }

        tracing::info!("No config file found, using built-in default config");
        tracing::debug!(
            "Searched: {}",
            search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ConfigLoadResult {
            config: Self::from_default_toml()?,
            source: None,
            used_defaults: true,
        })
    }

    /// Get the list of paths to search for config files.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. $XDG_CONFIG_HOME/shade/config.toml
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("shade/config.toml"));
        }

        // 2. ~/.config/shade/config.toml
        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/shade/config.toml"));
        }

        // 3. ./shade.toml (cwd)
        paths.push(PathBuf::from("shade.toml"));

        paths
    }

    /// Validate the configuration, returning every invalid value at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.log_level.parse::<LogLevel>().is_err() {
            errors.push(format!(
                "log_level: invalid value '{}', expected one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }

        if self.rewrite.max_passes == 0 {
            errors.push("rewrite.max_passes: must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation(errors))
        }
    }

    /// The configured log level, falling back to the default when invalid.
    ///
    /// Call [`validate`](Self::validate) first to reject bad values.
    pub fn log_level(&self) -> LogLevel {
        self.log_level.parse().unwrap_or_default()
    }
}

/// Deep merge two TOML tables, with `overlay` values taking precedence.
///
/// Nested tables merge recursively; any other value is replaced outright.
fn deep_merge_toml(base: &mut Table, overlay: Table) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge_toml(base_table, overlay_table);
            }
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Declaration rewriting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Maximum number of passes over one declaration value. Each level of
    /// `lighten()`/`darken()` nesting costs one pass.
    pub max_passes: u32,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self { max_passes: 16 }
    }
}

/// Variable substitution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariablesConfig {
    /// Expand `$name` references and drop `$name: value;` definitions.
    pub enabled: bool,
}

impl Default for VariablesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
