//! Diagnostic logging on stderr via tracing.
//!
//! This is separate from the session log: it carries debug/trace output
//! for operators, the session log carries the user-facing record.

use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::LogLevel;

impl LogLevel {
    fn filter(&self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Initializes the tracing subscriber. The CLI level wins over the
/// configured one.
pub fn setup_logging(cli_level: Option<&LogLevel>, configured: &str) {
    let level = match cli_level {
        Some(level) => level.filter(),
        None => configured
            .parse::<LevelFilter>()
            .unwrap_or(LevelFilter::WARN),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {}", level);
}
