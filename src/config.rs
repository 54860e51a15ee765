//! Configuration loading, defaults and validation.
//!
//! Precedence: CLI (if provided) > config file > default.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::MonitorError;
use crate::process::{DEFAULT_MAX_PROCESSES, DEFAULT_TOP_N};
use crate::reader::DEFAULT_PROC_ROOT;
use crate::session_log::DEFAULT_LOG_FILE;

pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_MENU_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_IO_BUFFER_KB: usize = 64;
/// Largest accepted read bound (1 GiB).
pub const MAX_IO_BUFFER_KB: usize = 1024 * 1024;

/// Locations probed when no `--config` is given.
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/herakles/sysmonitor.yaml",
    "/etc/herakles/sysmonitor.yml",
    "/etc/herakles/sysmonitor.json",
    "/etc/herakles/sysmonitor.toml",
    "./herakles-sysmonitor.yaml",
    "./herakles-sysmonitor.yml",
    "./herakles-sysmonitor.json",
    "./herakles-sysmonitor.toml",
];

/// Configuration format options for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Counter sources
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "io-buffer-kb")]
    pub io_buffer_kb: Option<usize>,

    // Ranking
    #[serde(alias = "top-n")]
    pub top_n: Option<usize>,
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,

    // Session
    #[serde(alias = "menu-interval-secs")]
    pub menu_interval_secs: Option<u64>,
    #[serde(alias = "clear-screen")]
    pub clear_screen: Option<bool>,

    // Logging
    #[serde(alias = "log-file")]
    pub log_file: Option<PathBuf>,
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            io_buffer_kb: Some(DEFAULT_IO_BUFFER_KB),
            top_n: Some(DEFAULT_TOP_N),
            max_processes: Some(DEFAULT_MAX_PROCESSES),
            menu_interval_secs: Some(DEFAULT_MENU_INTERVAL_SECS),
            clear_screen: Some(true),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
        }
    }
}

impl Config {
    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn io_buffer_bytes(&self) -> usize {
        self.io_buffer_kb
            .unwrap_or(DEFAULT_IO_BUFFER_KB)
            .saturating_mul(1024)
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn max_processes(&self) -> usize {
        self.max_processes.unwrap_or(DEFAULT_MAX_PROCESSES)
    }

    pub fn menu_interval_secs(&self) -> u64 {
        self.menu_interval_secs.unwrap_or(DEFAULT_MENU_INTERVAL_SECS)
    }

    pub fn clear_screen(&self) -> bool {
        self.clear_screen.unwrap_or(true)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Fills unset fields from `fallback`.
    fn merged_over(self, fallback: Config) -> Config {
        Config {
            proc_root: self.proc_root.or(fallback.proc_root),
            io_buffer_kb: self.io_buffer_kb.or(fallback.io_buffer_kb),
            top_n: self.top_n.or(fallback.top_n),
            max_processes: self.max_processes.or(fallback.max_processes),
            menu_interval_secs: self.menu_interval_secs.or(fallback.menu_interval_secs),
            clear_screen: self.clear_screen.or(fallback.clear_screen),
            log_file: self.log_file.or(fallback.log_file),
            log_level: self.log_level.or(fallback.log_level),
        }
    }
}

/// Validate effective config (used at startup)
pub fn validate_effective_config(cfg: &Config) -> std::result::Result<(), MonitorError> {
    let positive = [
        ("top_n", cfg.top_n.map(|v| v as u64)),
        ("max_processes", cfg.max_processes.map(|v| v as u64)),
        ("menu_interval_secs", cfg.menu_interval_secs),
        ("io_buffer_kb", cfg.io_buffer_kb.map(|v| v as u64)),
    ];
    for (name, value) in positive {
        if value == Some(0) {
            return Err(MonitorError::Validation(format!(
                "{name} must be at least 1"
            )));
        }
    }

    if let Some(kb) = cfg.io_buffer_kb {
        if kb > MAX_IO_BUFFER_KB {
            return Err(MonitorError::Validation(format!(
                "io_buffer_kb must be at most {MAX_IO_BUFFER_KB}"
            )));
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if !matches!(
            level.to_ascii_lowercase().as_str(),
            "off" | "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(MonitorError::Validation(format!(
                "Invalid log_level '{level}', expected off, error, warn, info, debug or trace"
            )));
        }
    }

    Ok(())
}

/// Loads configuration from `path`, or from the first existing default
/// location. Missing files yield the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parse_config(&content, &path)?;
    Ok(config.merged_over(Config::default()))
}

fn parse_config(content: &str, path: &Path) -> Result<Config> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(content)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(content)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}
