//! Evaluation configuration loading and resolution.
//!
//! Resolution order: CLI argument → environment variables → XDG config → defaults.
//!
//! ```toml
//! threshold = 0.5
//! numeric_errors = "warn"   # ignore | warn | raise
//! output = "text"           # text | json
//! ```

use crate::error::{Error, Result};
use crate::metrics::DEFAULT_THRESHOLD;
use crate::numeric::NumericErrorPolicy;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable names.
const ENV_CONFIG_PATH: &str = "CE_CONFIG";
const ENV_CONFIG_DIR: &str = "CE_CONFIG_DIR";

/// Standard config file name.
const CONFIG_FILENAME: &str = "config.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "classifier-eval";

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated text report, one block per task
    #[default]
    Text,

    /// Per-task metric records as JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    /// Decision threshold for the accuracy metrics.
    pub threshold: f64,
    /// Handling of NaN/inf produced by degenerate tasks.
    pub numeric_errors: NumericErrorPolicy,
    /// Default report format.
    pub output: OutputFormat,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            threshold: DEFAULT_THRESHOLD,
            numeric_errors: NumericErrorPolicy::default(),
            output: OutputFormat::default(),
        }
    }
}

impl EvalConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EvalConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values no evaluation can use.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Where the configuration was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A loaded configuration and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub config: EvalConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Get the XDG config directory for classifier-eval.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Resolve the config file path using the standard resolution order.
///
/// 1. Explicit CLI path (used even if missing, so loading reports the error)
/// 2. `CE_CONFIG` (direct path)
/// 3. `CE_CONFIG_DIR` + `config.toml`
/// 4. XDG config directory (`~/.config/classifier-eval/config.toml`)
/// 5. Built-in defaults (None)
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    resolve_config_path_with(cli_path, |var| std::env::var(var).ok(), xdg_config_dir())
}

fn resolve_config_path_with(
    cli_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    xdg_dir: Option<PathBuf>,
) -> (Option<PathBuf>, ConfigSource) {
    // 1. CLI argument
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    // 2. Environment variable (direct path)
    if let Some(env_path) = env(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Some(config_dir) = env(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_dir {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Resolve and load the configuration.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (path, source) = resolve_config_path(cli_path);
    let config = match &path {
        Some(p) => EvalConfig::load(p)?,
        None => EvalConfig::default(),
    };
    tracing::debug!(source = %source, path = ?path, "resolved configuration");
    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}
