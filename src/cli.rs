//! # Command Line Interface
//!
//! All runtime settings come from the environment; the flags only pick a mode.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "license-exporter")]
#[command(about = "Exports platform licenses as Prometheus metrics and keeps the GitLab token rotated")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Run one tick, wait for the license refreshes, then exit
    #[arg(long)]
    pub once: bool,

    /// Validate configuration and exit without contacting any service
    #[arg(long, conflicts_with = "once")]
    pub check_config: bool,
}
