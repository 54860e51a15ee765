//! CLI arguments for herakles-sysmonitor.
//!
//! The short flags `-h`, `-m` and `-c` select the run mode and are
//! resolved by hand so that bad values and conflicting flags produce the
//! monitor's own messages instead of clap's.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use herakles_sysmonitor::config::{load_config, ConfigFormat, Config};
use herakles_sysmonitor::{Metric, Mode, MonitorError};

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-sysmonitor",
    about = "CPU, memory and process monitor reading straight from /proc",
    author = "Michael Moll <proc-mem@herakles.io> - Herakles IO",
    version = "0.1.0",
    disable_help_flag = true
)]
pub struct Args {
    /// Display usage information
    #[arg(short = 'h')]
    pub help: bool,

    /// Show a single metric: cpu, mem or proc
    #[arg(short = 'm', value_name = "METRIC")]
    pub metric: Option<String>,

    /// Continuous monitoring with the given refresh interval in seconds
    #[arg(short = 'c', value_name = "SECONDS", allow_hyphen_values = true)]
    pub interval: Option<String>,

    /// Config file (YAML/JSON/TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Read counters from this directory instead of /proc
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Session log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Diagnostic log level on stderr (overrides config)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Number of processes to list
    #[arg(long)]
    pub top_n: Option<usize>,
}

/// What the command line asks for once the mode flags are resolved.
#[derive(Debug, PartialEq)]
pub enum Invocation {
    Help,
    Run(Mode),
}

impl Args {
    /// Resolves `-h`, `-m` and `-c` into the requested mode. No flag means
    /// the interactive menu; more than one is a usage error.
    pub fn invocation(&self) -> Result<Invocation, MonitorError> {
        let selected = [self.help, self.metric.is_some(), self.interval.is_some()]
            .iter()
            .filter(|set| **set)
            .count();
        if selected > 1 {
            return Err(MonitorError::Usage);
        }

        if self.help {
            return Ok(Invocation::Help);
        }

        if let Some(raw) = &self.metric {
            return Metric::from_arg(raw)
                .map(|metric| Invocation::Run(Mode::OneShot(metric)))
                .ok_or_else(|| {
                    MonitorError::Validation("Invalid Parameter. Use -m [cpu|mem|proc]".into())
                });
        }

        if let Some(raw) = &self.interval {
            return parse_interval(raw).map(|interval| Invocation::Run(Mode::Continuous(interval)));
        }

        Ok(Invocation::Run(Mode::Menu))
    }
}

/// Parses a `-c` value: a whole number of seconds greater than zero.
pub fn parse_interval(raw: &str) -> Result<Duration, MonitorError> {
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs as u64)),
        _ => Err(MonitorError::Validation(
            "interval must be a positive integer".into(),
        )),
    }
}

/// Loads the config file (unless disabled) and applies CLI overrides.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Override with CLI args
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(path) = &args.log_file {
        config.log_file = Some(path.clone());
    }
    if let Some(n) = args.top_n {
        config.top_n = Some(n);
    }
    if let Some(level) = &args.log_level {
        if let Some(value) = level.to_possible_value() {
            config.log_level = Some(value.get_name().to_string());
        }
    }

    Ok(config)
}
