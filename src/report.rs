//! Human-readable report blocks and the matching session-log messages.

use std::fmt::Write as FmtWrite;

use crate::metrics::{CpuUsage, MemoryUsage};
use crate::process::Ranking;

pub const HELP_TEXT: &str = "
Herakles SysMonitor - System Monitoring Tool
============================================

Usage:
  herakles-sysmonitor              Interactive menu mode
  herakles-sysmonitor -m cpu       Display CPU usage only
  herakles-sysmonitor -m mem       Display memory usage only
  herakles-sysmonitor -m proc      List top 5 active processes
  herakles-sysmonitor -c <seconds> Continuous monitoring mode
  herakles-sysmonitor -h           Display this help message

Options:
  --config <FILE>         Config file (YAML/JSON/TOML)
  --no-config             Disable all config file loading
  --show-config           Print effective merged config and exit
  --config-format <FMT>   Output format for --show-config (yaml, json, toml)
  --proc-root <DIR>       Read counters from DIR instead of /proc
  --log-file <FILE>       Session log file (default: syslog.txt)
  --log-level <LEVEL>     Diagnostic log level on stderr
  --top-n <N>             Number of processes to list

Examples:
  herakles-sysmonitor -c 2         Monitor every 2 seconds
  herakles-sysmonitor -m cpu       Show CPU usage once
";

pub fn render_menu(top_n: usize) -> String {
    format!(
        "\n=== Herakles SysMonitor Main Menu ===\n\
         1. CPU Usage\n\
         2. Memory Usage\n\
         3. Top {top_n} Processes\n\
         4. Continuous Monitoring\n\
         5. Exit\n\
         Enter your choice: "
    )
}

/// ANSI sequence that clears the screen and homes the cursor.
pub const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

pub fn render_cpu(usage: CpuUsage) -> String {
    let mut out = String::new();
    writeln!(out, "\n=== CPU Usage ===").ok();
    match usage {
        CpuUsage::Initializing => {
            writeln!(out, "Initializing CPU monitoring...").ok();
            writeln!(out, "Run again to see CPU usage.").ok();
        }
        CpuUsage::Percent(pct) => {
            writeln!(out, "CPU Usage: {:.1}%", pct).ok();
        }
    }
    writeln!(out).ok();
    out
}

pub fn cpu_log_message(usage: CpuUsage) -> String {
    match usage {
        CpuUsage::Initializing => "CPU monitoring initialized".to_string(),
        CpuUsage::Percent(pct) => format!("CPU Usage: {:.1}%", pct),
    }
}

pub fn render_memory(usage: &MemoryUsage) -> String {
    let mut out = String::new();
    writeln!(out, "\n=== Memory Usage ===").ok();
    writeln!(out, "Total Memory:  {} MB", usage.total_mb).ok();
    writeln!(out, "Used Memory:   {} MB", usage.used_mb).ok();
    writeln!(out, "Free Memory:   {} MB", usage.free_mb).ok();
    writeln!(out, "Usage:         {:.1}%", usage.usage_percent).ok();
    writeln!(out, "{}", "=".repeat(20)).ok();
    out
}

pub fn memory_log_message(usage: &MemoryUsage) -> String {
    format!(
        "Memory - Total: {}MB, Used: {}MB, Free: {}MB ({:.1}%)",
        usage.total_mb, usage.used_mb, usage.free_mb, usage.usage_percent
    )
}

pub fn render_processes(ranking: &Ranking, top_n: usize) -> String {
    let mut out = String::new();
    writeln!(out, "\n=== Top {} Active Processes ===", top_n).ok();

    if ranking.is_empty() {
        writeln!(out, "No processes found.\n").ok();
        return out;
    }

    writeln!(
        out,
        "{:<10} {:<30} {:<15} {:<12} {:<10}",
        "PID", "Process Name", "CPU Time", "CPU Sec", "Relative %"
    )
    .ok();
    writeln!(out, "{}", "=".repeat(80)).ok();

    for p in &ranking.top {
        writeln!(
            out,
            "{:<10} {:<30} {:<15} {:<12.2} {:.2}%",
            p.pid,
            p.name,
            p.total_time,
            p.cpu_seconds(),
            p.cpu_percent
        )
        .ok();
    }
    writeln!(out).ok();
    out
}

pub fn processes_log_message(ranking: &Ranking, top_n: usize) -> String {
    match ranking.top.first() {
        Some(top) => format!(
            "Top {} processes displayed: Top process PID={} ({}) with {} CPU time",
            top_n,
            top.pid,
            top.name,
            top.total_time
        ),
        None => "No processes found".to_string(),
    }
}

/// Header printed at the start of every continuous-mode iteration.
pub fn render_monitor_header(timestamp: &str) -> String {
    format!("=== Continuous Monitoring ===\nTimestamp: {timestamp}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessRecord, ProcessTimes};

    #[test]
    fn test_render_cpu() {
        let text = render_cpu(CpuUsage::Percent(42.345));
        assert!(text.contains("=== CPU Usage ==="));
        assert!(text.contains("CPU Usage: 42.3%"));
        assert_eq!(cpu_log_message(CpuUsage::Percent(42.345)), "CPU Usage: 42.3%");
    }

    #[test]
    fn test_render_cpu_initializing_is_distinct() {
        let text = render_cpu(CpuUsage::Initializing);
        assert!(text.contains("Initializing CPU monitoring..."));
        assert!(!text.contains('%'));
        assert_eq!(cpu_log_message(CpuUsage::Initializing), "CPU monitoring initialized");
    }

    #[test]
    fn test_render_memory() {
        let usage = MemoryUsage {
            total_mb: 10,
            used_mb: 8,
            free_mb: 2,
            usage_percent: 80.0,
        };
        let text = render_memory(&usage);
        assert!(text.contains("Total Memory:  10 MB"));
        assert!(text.contains("Used Memory:   8 MB"));
        assert!(text.contains("Usage:         80.0%"));
        assert_eq!(
            memory_log_message(&usage),
            "Memory - Total: 10MB, Used: 8MB, Free: 2MB (80.0%)"
        );
    }

    #[test]
    fn test_render_processes() {
        let mut rec = ProcessRecord::new(
            1234,
            "postgres",
            ProcessTimes {
                utime: 900,
                stime: 100,
            },
        );
        rec.cpu_percent = 100.0;
        let ranking = Ranking {
            top: vec![rec],
            total_count: 17,
        };

        let text = render_processes(&ranking, 5);
        assert!(text.contains("=== Top 5 Active Processes ==="));
        assert!(text.contains("Process Name"));
        let row = text.lines().find(|l| l.starts_with("1234")).unwrap();
        assert!(row.contains("postgres"));
        assert!(row.contains("1000"));
        assert!(row.ends_with("100.00%"));

        assert_eq!(
            processes_log_message(&ranking, 5),
            "Top 5 processes displayed: Top process PID=1234 (postgres) with 1000 CPU time"
        );
    }

    #[test]
    fn test_render_no_processes() {
        let ranking = Ranking::default();
        assert!(render_processes(&ranking, 5).contains("No processes found."));
        assert_eq!(processes_log_message(&ranking, 5), "No processes found");
    }
}
