//! Configuration loading and parsing

use anyhow::{Context, Result};
use g7_report_core::DEFAULT_LOG_DIR;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of printers in the default fleet
const DEFAULT_PRINTER_COUNT: usize = 10;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub printers: PrintersConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_reference_path")]
    pub path: PathBuf,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            path: default_reference_path(),
        }
    }
}

fn default_reference_path() -> PathBuf {
    PathBuf::from("data/g7_reference_lab.csv")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrintersConfig {
    #[serde(default = "default_printers")]
    pub names: Vec<String>,
}

impl Default for PrintersConfig {
    fn default() -> Self {
        Self {
            names: default_printers(),
        }
    }
}

fn default_printers() -> Vec<String> {
    (1..=DEFAULT_PRINTER_COUNT)
        .map(|i| format!("Mutoh 924 #{}", i))
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_week")]
    pub default_week: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_week: default_week(),
        }
    }
}

fn default_week() -> String {
    "enter date".to_string()
}

impl AppConfig {
    /// Resolve a printer by 1-based index or exact name
    pub fn find_printer(&self, selector: &str) -> Option<&str> {
        let names = &self.printers.names;
        if let Ok(index) = selector.trim().parse::<usize>() {
            return index.checked_sub(1).and_then(|i| names.get(i)).map(String::as_str);
        }
        names.iter().find(|n| n.as_str() == selector.trim()).map(String::as_str)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.printers.names.is_empty() {
        anyhow::bail!("Config file {:?} lists no printers", path);
    }

    Ok(config)
}
