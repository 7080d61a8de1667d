//! Command-line interface.

use clap::{Parser, Subcommand};

/// syncd - container registry replication daemon.
#[derive(Parser, Debug)]
#[command(name = "syncd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the replication config file.
    #[arg(long, global = true, default_value = "config.yaml")]
    pub config: String,

    /// Seconds to wait before the first replication pass starts.
    #[arg(long, global = true, default_value_t = 10)]
    pub delay: u64,

    /// Enable dev-mode proxy routes on the status server.
    #[arg(long, global = true)]
    pub dev: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the replication daemon (the default when no subcommand is given).
    Serve,
    /// Load the config file and print the effective configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as parsed.
    Show,
}

impl Cli {
    /// Maps the repeated `-v` flag to a log level, the same occurrence-count
    /// convention `policy-engine` uses.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
