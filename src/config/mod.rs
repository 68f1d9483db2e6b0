use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::human_input::{HumanExchange, LauncherChain};

/// Config file names searched, in order, when no path is given
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "mcp_ask_human.config.yaml",
    "config/mcp_ask_human.config.yaml",
];

/// Settings for the ask-human server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Logger settings
    #[serde(default)]
    pub logger: LoggerSettings,

    /// Where session directories go
    #[serde(default)]
    pub workspace: WorkspaceSettings,

    /// Which terminals to try
    #[serde(default)]
    pub terminal: TerminalSettings,
}

/// Logger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Session workspace settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Root for session directories; the system temp dir when unset
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Terminal launcher settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Launcher names to try, in order. Empty keeps the platform default.
    #[serde(default)]
    pub launchers: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Exchange configured from these settings. The timeout is never configurable.
    pub fn exchange(&self) -> HumanExchange {
        let chain = LauncherChain::for_host_with_order(&self.terminal.launchers);
        let exchange = HumanExchange::new(Arc::new(chain));
        match &self.workspace.root {
            Some(root) => exchange.with_workspace_root(root),
            None => exchange,
        }
    }
}

/// Load settings from a YAML file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    parse_settings(&contents)
}

/// Parse settings from YAML text. An empty document yields the defaults.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(contents)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
}

/// Get settings, optionally from a specific file
pub fn get_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => load_settings(path),
        None => {
            for path in DEFAULT_CONFIG_PATHS {
                if Path::new(path).exists() {
                    return load_settings(path);
                }
            }

            Ok(Settings::default())
        }
    }
}
