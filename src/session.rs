//! Session driver: one-shot reports, the interactive menu and the
//! continuous monitoring loop.
//!
//! A `Session` owns the CPU delta engine, the session log and two output
//! writers: reports go to `out`, failure notices to `err_out`. Report
//! failures are surfaced and logged; none of them end the session.

use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::MonitorError;
use crate::metrics::{memory_usage, CpuUsage, CpuUsageEngine};
use crate::process::top_processes;
use crate::reader::ProcFs;
use crate::report;
use crate::session_log::{current_timestamp, SessionLog};
use crate::shutdown::Shutdown;
use crate::system::{read_cpu_sample, read_memory_sample};

/// Gap between the two samples of a one-shot CPU report.
const ONE_SHOT_CPU_GAP: Duration = Duration::from_secs(1);

/// Metric selected with `-m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cpu,
    Memory,
    Processes,
}

impl Metric {
    pub fn from_arg(value: &str) -> Option<Self> {
        match value {
            "cpu" => Some(Metric::Cpu),
            "mem" => Some(Metric::Memory),
            "proc" => Some(Metric::Processes),
            _ => None,
        }
    }
}

/// What a session does once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Menu,
    OneShot(Metric),
    Continuous(Duration),
}

pub struct Session<W: Write, E: Write> {
    procfs: ProcFs,
    engine: CpuUsageEngine,
    log: SessionLog,
    shutdown: Shutdown,
    top_n: usize,
    max_processes: usize,
    menu_interval: Duration,
    clear_screen: bool,
    out: W,
    err_out: E,
}

impl<W: Write, E: Write> Session<W, E> {
    /// Starts a session and writes the start marker.
    pub fn start(
        config: &Config,
        mut log: SessionLog,
        shutdown: Shutdown,
        out: W,
        err_out: E,
    ) -> Self {
        log.write("Session started");
        info!(
            "Session started (proc root: {}, log: {})",
            config.proc_root().display(),
            log.path().display()
        );

        Self {
            procfs: ProcFs::new(config.proc_root(), config.io_buffer_bytes()),
            engine: CpuUsageEngine::new(),
            log,
            shutdown,
            top_n: config.top_n(),
            max_processes: config.max_processes(),
            menu_interval: Duration::from_secs(config.menu_interval_secs()),
            clear_screen: config.clear_screen(),
            out,
            err_out,
        }
    }

    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, mode: Mode, input: R) {
        debug!("Running mode {:?}", mode);
        match mode {
            Mode::Menu => self.menu(input).await,
            Mode::OneShot(metric) => self.one_shot(metric).await,
            Mode::Continuous(interval) => self.continuous(interval).await,
        }
    }

    /// Reports a rejected argument; no metric is produced.
    pub fn reject(&mut self, err: &MonitorError) {
        match err {
            MonitorError::Usage => self.emit(&format!("{err}\n")),
            _ => self.emit(&format!("Error: {err}\n")),
        }
        self.log.write(&format!("Error: {err}"));
    }

    /// Samples CPU counters and reports usage against the previous sample.
    pub fn report_cpu(&mut self) {
        let sample = match read_cpu_sample(&self.procfs) {
            Ok(s) => s,
            Err(e) => {
                self.surface("CPU statistics unavailable", &e);
                return;
            }
        };

        let usage = self.engine.compute(sample);
        if let CpuUsage::Percent(pct) = usage {
            debug!("CPU usage {:.2}%", pct);
        }
        self.emit(&report::render_cpu(usage));
        self.log.write(&report::cpu_log_message(usage));
    }

    pub fn report_memory(&mut self) {
        let sample = match read_memory_sample(&self.procfs) {
            Ok(s) => s,
            Err(e) => {
                self.surface("Memory statistics unavailable", &e);
                return;
            }
        };

        let usage = memory_usage(&sample);
        self.emit(&report::render_memory(&usage));
        self.log.write(&report::memory_log_message(&usage));
    }

    pub fn report_processes(&mut self) {
        match top_processes(&self.procfs, self.top_n, self.max_processes) {
            Ok(ranking) => {
                self.emit(&report::render_processes(&ranking, self.top_n));
                self.log.write(&report::processes_log_message(&ranking, self.top_n));
            }
            Err(e) => self.surface("Failed to open process directory", &e),
        }
    }

    /// Single report; CPU takes two samples one second apart.
    pub async fn one_shot(&mut self, metric: Metric) {
        match metric {
            Metric::Cpu => {
                self.report_cpu();
                if self.pause(ONE_SHOT_CPU_GAP).await {
                    self.report_cpu();
                }
            }
            Metric::Memory => self.report_memory(),
            Metric::Processes => self.report_processes(),
        }
    }

    /// Samples everything every `interval` until shutdown is requested.
    #[instrument(skip(self))]
    pub async fn continuous(&mut self, interval: Duration) {
        self.log.write("Continuous monitoring started");
        info!("Continuous monitoring every {}s", interval.as_secs());

        while !self.shutdown.is_requested() {
            if self.clear_screen {
                self.emit(report::CLEAR_SCREEN);
            }
            self.emit(&report::render_monitor_header(&current_timestamp()));

            self.report_cpu();
            self.report_memory();
            self.report_processes();

            if !self.pause(interval).await {
                break;
            }
        }
        self.log.write("Continuous monitoring stopped");
        debug!("Continuous monitoring loop left");
    }

    /// Interactive menu reading one choice per line from `input`.
    pub async fn menu<R: AsyncBufRead + Unpin>(&mut self, input: R) {
        let mut lines = input.lines();

        while !self.shutdown.is_requested() {
            self.emit(&report::render_menu(self.top_n));

            let line = tokio::select! {
                line = lines.next_line() => line,
                _ = self.shutdown.wait() => break,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.log.write("Menu input closed");
                    self.emit("\nExiting...\n");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read menu input: {}", e);
                    self.log.write(&format!("Error: failed to read menu input: {e}"));
                    break;
                }
            };

            let choice = line.trim();
            if choice.is_empty() {
                continue;
            }

            match choice.parse::<i64>() {
                Err(_) => self.emit("Invalid input. Please enter a number.\n"),
                Ok(1) => self.report_cpu(),
                Ok(2) => self.report_memory(),
                Ok(3) => self.report_processes(),
                Ok(4) => self.continuous(self.menu_interval).await,
                Ok(5) => {
                    self.log.write("User exited from menu");
                    self.emit("Exiting...\n");
                    break;
                }
                Ok(_) => self.emit("Invalid choice. Please select 1-5.\n"),
            }
        }
    }

    /// Writes the end marker and closes the log. After a signal the
    /// farewell and the signal marker come first. Returns the writer.
    pub fn end(mut self) -> W {
        if let Some(sig) = self.shutdown.signal() {
            self.emit("\n\nExiting... Saving log.\n");
            self.log.write(&format!("{} received", sig.name()));
        }
        let Session { mut log, out, .. } = self;
        log.write("Session ended");
        log.close();
        info!("Session ended");
        out
    }

    /// Sleeps for `duration`; returns false if shutdown cut it short.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.shutdown.wait() => false,
        }
    }

    fn surface(&mut self, context: &str, err: &MonitorError) {
        let severity = match err {
            MonitorError::MalformedCounterLine(_) => "Error",
            _ => "Warning",
        };
        if let Err(e) = writeln!(self.err_out, "{severity}: {context}: {err}") {
            debug!("Failed to write error output: {}", e);
        }
        warn!("{}: {}", context, err);
        self.log.write(&format!("Error: {context}: {err}"));
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
        {
            debug!("Failed to write output: {}", e);
        }
    }
}
