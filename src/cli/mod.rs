pub mod onboard;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "SiteTime",
    about = "Per-website time tracking & productivity reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive first-run setup
    Onboard,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Doctor,
    /// Run the HTTP API until Ctrl+C
    Service,
    /// Print the daily summary and top domains
    Report {
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = 1)]
        days: u32,
    },
    /// Recompute every daily summary from the stored entries
    Rebuild,
    Categorize {
        url: String,
    },
    /// Read tab events as JSON lines from stdin and submit finished sessions
    Track,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
