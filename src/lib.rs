//! herakles-sysmonitor: point-in-time and continuous system resource
//! monitoring straight from /proc.
//!
//! The core is synchronous: [`reader`] fetches raw counter text, [`system`]
//! and [`process`] parse it, [`metrics`] turns samples into percentages and
//! [`process`] ranks processes by CPU time. [`session`] drives reports,
//! the menu and the continuous loop on top of that.

pub mod config;
pub mod error;
pub mod metrics;
pub mod process;
pub mod reader;
pub mod report;
pub mod session;
pub mod session_log;
pub mod shutdown;
pub mod system;

pub use error::{MonitorError, Result};
pub use metrics::{CpuUsage, CpuUsageEngine};
pub use session::{Metric, Mode, Session};
