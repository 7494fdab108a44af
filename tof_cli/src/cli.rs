//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tof", version, about = "Time-of-flight range acquisition")]
pub struct Cli {
    /// Path to config TOML; built-in defaults are used when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit status lines and errors as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the sensor and print one status line per polling period
    Run {
        /// Stop after this many periods (overrides acquisition.max_periods)
        #[arg(long, value_name = "N")]
        periods: Option<u64>,
        /// Polling period in ms (overrides acquisition.period_ms)
        #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..=60_000))]
        period_ms: Option<u64>,
        /// Report raw distances without median filtering
        #[arg(long, action = ArgAction::SetTrue)]
        no_filter: bool,
        /// Enable real-time mode (SCHED_FIFO, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority and calls mlockall(MCL_CURRENT|MCL_FUTURE). Requires CAP_SYS_NICE / CAP_IPC_LOCK or root; failures are logged and the run continues without them."
        )]
        rt: bool,
        /// SCHED_FIFO priority when --rt is enabled (overrides runner.rt_prio)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
    },
    /// Initialize the sensor once and report whether it is usable
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
