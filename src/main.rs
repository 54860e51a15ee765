//! herakles-sysmonitor
//!
//! Entry point: parses the command line, resolves the configuration and
//! runs one monitoring session. Every handled outcome exits with status 0.

mod cli;
mod logging;

use clap::error::ErrorKind;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{debug, info};

use herakles_sysmonitor::config::{render_config, validate_effective_config};
use herakles_sysmonitor::report::HELP_TEXT;
use herakles_sysmonitor::session_log::SessionLog;
use herakles_sysmonitor::shutdown::Shutdown;
use herakles_sysmonitor::{MonitorError, Session};

use cli::{resolve_config, Args, Invocation};
use logging::setup_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => {
            print!("{}", e);
            return Ok(());
        }
        Err(_) => {
            println!("{}", MonitorError::Usage);
            return Ok(());
        }
    };

    // -h short-circuits before any file is touched
    let mode = match args.invocation() {
        Ok(Invocation::Help) => {
            print!("{}", HELP_TEXT);
            return Ok(());
        }
        Ok(Invocation::Run(mode)) => Ok(mode),
        Err(e) => Err(e),
    };

    let config = match resolve_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: Failed to load configuration: {:#}", e);
            return Ok(());
        }
    };

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("Error: Configuration invalid: {}", e);
        return Ok(());
    }

    if args.show_config {
        match render_config(&config, args.config_format) {
            Ok(text) => print!("{}", text),
            Err(e) => eprintln!("Error: Failed to render configuration: {:#}", e),
        }
        return Ok(());
    }

    setup_logging(args.log_level.as_ref(), config.log_level());
    info!("Starting herakles-sysmonitor");

    let shutdown = Shutdown::new();
    shutdown.listen_for_signals();

    let log = SessionLog::open_or_disabled(&config.log_file());
    let mut session = Session::start(
        &config,
        log,
        shutdown.clone(),
        std::io::stdout(),
        std::io::stderr(),
    );

    match mode {
        Ok(mode) => {
            session
                .run(mode, BufReader::new(tokio::io::stdin()))
                .await
        }
        Err(e) => session.reject(&e),
    }

    session.end();

    if shutdown.is_requested() {
        // a pending stdin read would otherwise hold the runtime open
        debug!("Exiting after shutdown signal");
        std::process::exit(0);
    }

    Ok(())
}
