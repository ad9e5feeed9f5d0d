//! Configuration types, defaults, loading, and validation.

use crate::protocol::{ClientOptions, WireDialect};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Tool-serving process configuration
    #[serde(default)]
    pub tool_server: ToolServerConfig,

    /// Intent routing configuration
    #[serde(default)]
    pub router: RouterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Also log to a daily-rotated file at this path
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How to start and talk to the tool-serving process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolServerConfig {
    /// Executable to launch (default: "python")
    #[serde(default = "default_tool_command")]
    pub command: String,

    /// Arguments (default: ["-m", "mcp_server.server"])
    #[serde(default = "default_tool_args")]
    pub args: Vec<String>,

    /// Working directory for the tool server
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Wire dialect: "mcp" (default) or "direct"
    #[serde(default)]
    pub dialect: WireDialect,

    /// Per-call reply timeout in milliseconds (default: 10000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts for read-only tools; 1 disables retry (default: 1)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base backoff between attempts in milliseconds (default: 200)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_tool_command() -> String {
    "python".to_string()
}

fn default_tool_args() -> Vec<String> {
    vec!["-m".to_string(), "mcp_server.server".to_string()]
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    200
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            command: default_tool_command(),
            args: default_tool_args(),
            working_dir: None,
            dialect: WireDialect::default(),
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ToolServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            dialect: self.dialect,
            timeout: self.timeout(),
            retry_attempts: self.retry_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Limit used for list requests that don't name one (default: 10)
    #[serde(default = "default_list_limit")]
    pub default_list_limit: u32,

    /// Upper bound on any requested list limit (default: 100)
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: u32,
}

fn default_list_limit() -> u32 {
    10
}

fn default_max_list_limit() -> u32 {
    100
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_list_limit: default_list_limit(),
            max_list_limit: default_max_list_limit(),
        }
    }
}

/// `~/.support-mesh`
pub fn support_mesh_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".support-mesh")
}

/// Deep-merge `overlay` into `base`: tables merge recursively, any other
/// value replaces what was there.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. System config: ~/.support-mesh/config.toml
    /// 3. Local config: ./support-mesh.toml
    /// 4. Environment variables
    pub fn load() -> Result<Self> {
        tracing::debug!("Loading configuration...");

        let mut config = Self::default();

        if let Some(system_config_path) = Self::system_config_path()
            && system_config_path.exists()
        {
            tracing::debug!("Loading system config from: {:?}", system_config_path);
            config = Self::merge_from_file(config, &system_config_path)?;
        }

        let local_config_path = Self::local_config_path();
        if local_config_path.exists() {
            tracing::debug!("Loading local config from: {:?}", local_config_path);
            config = Self::merge_from_file(config, &local_config_path)?;
        }

        config = Self::apply_env_overrides(config, |key| std::env::var(key).ok())?;

        tracing::debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from a specific file path
    ///
    /// Priority (lowest to highest):
    /// 1. Default values
    /// 2. Custom config file (specified path)
    /// 3. Environment variables
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from custom path: {:?}", path);

        if !path.exists() {
            anyhow::bail!("Config file not found: {:?}", path);
        }
        let config = Self::merge_from_file(Self::default(), path)?;
        let config = Self::apply_env_overrides(config, |key| std::env::var(key).ok())?;

        tracing::debug!("Configuration loaded successfully from custom path");
        Ok(config)
    }

    /// Get the system config path: ~/.support-mesh/config.toml
    pub fn system_config_path() -> Option<PathBuf> {
        Some(support_mesh_home().join("config.toml"))
    }

    /// Get the local config path: ./support-mesh.toml
    fn local_config_path() -> PathBuf {
        PathBuf::from("./support-mesh.toml")
    }

    /// Load a TOML file over `base`. Only the keys the file sets change.
    fn merge_from_file(base: Self, path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let overlay: toml::Table = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        let mut merged = match toml::Value::try_from(&base)
            .context("Failed to serialize base configuration")?
        {
            toml::Value::Table(table) => table,
            other => anyhow::bail!("Configuration serialized to a non-table: {}", other.type_str()),
        };
        merge_tables(&mut merged, overlay);

        toml::Value::Table(merged)
            .try_into()
            .with_context(|| format!("Invalid configuration in: {:?}", path))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides<F>(mut config: Self, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = var("SUPPORT_MESH_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(file) = var("SUPPORT_MESH_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }

        if let Some(command) = var("SUPPORT_MESH_TOOL_COMMAND") {
            config.tool_server.command = command;
        }

        if let Some(timeout) = var("SUPPORT_MESH_TOOL_TIMEOUT_MS") {
            config.tool_server.timeout_ms = timeout
                .parse()
                .with_context(|| format!("Invalid SUPPORT_MESH_TOOL_TIMEOUT_MS: {}", timeout))?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        tracing::debug!("Validating configuration...");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        if self.tool_server.command.trim().is_empty() {
            anyhow::bail!("tool_server.command is empty");
        }

        if self.tool_server.timeout_ms == 0 {
            anyhow::bail!("tool_server.timeout_ms must be greater than zero");
        }

        if self.tool_server.retry_attempts == 0 {
            anyhow::bail!("tool_server.retry_attempts must be at least 1");
        }

        if self.router.default_list_limit == 0
            || self.router.default_list_limit > self.router.max_list_limit
        {
            anyhow::bail!(
                "router.default_list_limit must be between 1 and max_list_limit ({})",
                self.router.max_list_limit
            );
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Configuration saved to: {:?}", path);
        Ok(())
    }
}
