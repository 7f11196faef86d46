//! Configuration loading and config file resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variable (`QCR_CONFIG` names the config file)
//! 3. TOML config file (`<config_dir>/qcr/config.toml`)
//! 4. Compiled defaults
//!
//! A missing config file is not an error: a warning is logged and compiled
//! defaults are used. A config file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable holding an explicit config file path
pub const CONFIG_ENV_VAR: &str = "QCR_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Defaults applied to every consolidation run
    #[serde(default)]
    pub defaults: ConsolidateDefaults,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Consolidation option defaults, overridden by command-line flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidateDefaults {
    /// Emit progress notices
    #[serde(default = "default_verbose")]
    pub verbose: bool,

    /// Decimal places for numeric columns
    #[serde(default)]
    pub round: Option<u32>,

    /// Minimum Consistency_PI a row must reach
    #[serde(default)]
    pub incl_cut: Option<f64>,

    /// Directory that relative export paths are resolved against
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for ConsolidateDefaults {
    fn default() -> Self {
        Self {
            verbose: default_verbose(),
            round: None,
            incl_cut: None,
            output_dir: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_verbose() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(cut) = self.defaults.incl_cut {
            if !cut.is_finite() {
                return Err(Error::Config(format!("incl_cut must be finite, got {}", cut)));
            }
        }
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Unknown log level '{}' (expected one of {})",
                self.logging.level,
                LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Resolve and load configuration
    ///
    /// `cli_path` wins over the environment variable, which wins over the
    /// platform config file. Falls back to compiled defaults when none of
    /// them names an existing file.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path, CONFIG_ENV_VAR) {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                debug!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Config file resolution following the priority order above
///
/// Returns `None` only when no explicit path was given and the platform
/// config file does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config file
    default_config_file().filter(|path| path.exists())
}

/// Platform config file location (`~/.config/qcr/config.toml` on Linux)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("qcr").join("config.toml"))
}
