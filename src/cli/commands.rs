use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Main CLI structure for the rig-watcher application
/// Uses clap's derive macros for automatic CLI generation
#[derive(Parser)]
#[command(author = "Kaipo Chen")]
#[command(version)] // Automatically uses version from Cargo.toml
#[command(about = "Rig Watcher CLI Tool - Poll ASIC mining-rig controllers and record hashrate, device, and pool telemetry")]
#[command(long_about = "Rig Watcher polls cgminer-dialect controller APIs over TCP/JSON with \
reachability probing, escalating per-attempt timeouts, and partial-failure-tolerant collection. \
Results can be printed as JSON or recorded into a local SQLite database for history.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands for the rig-watcher application
/// Each variant represents a different mode of operation
#[derive(Subcommand)]
pub enum Commands {
    /// One-shot poll of a single rig, printing the raw telemetry as JSON
    #[command(about = "Poll one rig once and print its telemetry as JSON")]
    #[command(long_about = "Runs a single collection cycle against one controller: reachability \
probe first, then the summary, edevs, estats, and pools commands with retries. \
Commands that produced no valid response are printed as null.\n\n\
Examples:\n  \
rigw poll --host 10.0.0.42                  # Default controller port 4028\n  \
rigw poll --host 10.0.0.42 --port 4029      # Non-standard port\n  \
rigw poll --host 10.0.0.42 --retry 5        # Larger retry budget\n  \
rigw poll --host 10.0.0.42 --pretty         # Human-readable output")]
    Poll {
        /// Controller hostname, IPv4, or IPv6 address
        #[arg(short = 'H', long, help = "Rig controller host")]
        host: String,

        /// Controller API port
        #[arg(short, long, default_value = "4028", help = "Rig controller API port")]
        port: u16,

        /// Retry budget for the probe and each command
        #[arg(short, long, default_value = "3", help = "Attempts per probe/fetch loop")]
        retry: u32,

        /// Pretty-print the JSON output
        #[arg(long, help = "Pretty-print JSON output")]
        pretty: bool,
    },

    /// Continuous fleet polling into the telemetry database
    #[command(about = "Poll all configured rigs on an interval and record telemetry")]
    #[command(long_about = "Polls every rig listed in the configuration file on a fixed \
interval. Each rig's cycle runs on a blocking worker so a dead rig never delays the \
others; results stream into the SQLite database as they complete. \
Press Ctrl-C to stop.\n\n\
Examples:\n  \
rigw watch                                  # Uses ./rig-watcher.toml\n  \
rigw watch --config /etc/rigw/fleet.toml    # Explicit configuration\n  \
rigw watch --interval 30                    # Override the poll interval")]
    Watch {
        /// Path to the configuration file
        #[arg(short, long, help = "Configuration file path")]
        config: Option<PathBuf>,

        /// Seconds between fleet polls (overrides configuration)
        #[arg(short, long, help = "Poll interval in seconds")]
        interval: Option<u64>,

        /// Database path (overrides configuration)
        #[arg(short, long, help = "SQLite database path")]
        database: Option<String>,
    },

    /// Create the telemetry database schema
    #[command(about = "Initialize the telemetry database")]
    InitDb {
        /// Database path (overrides configuration)
        #[arg(short, long, help = "SQLite database path")]
        database: Option<String>,

        /// Path to the configuration file
        #[arg(short, long, help = "Configuration file path")]
        config: Option<PathBuf>,
    },
}
