//! CLI command definitions and dispatch for the `outreach` binary.
//!
//! Uses clap derive macros for argument parsing. One verb per run
//! operation: `outreach start`, `outreach resume`, `outreach status`,
//! `outreach list`, plus `serve` for the REST API.

pub mod run;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run the personalized outreach pipeline.
#[derive(Parser)]
#[command(name = "outreach", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a new run from a job posting.
    Start {
        /// The initiating message; a job posting URL works directly.
        message: String,

        /// Explicit posting URL (overrides one derived from the message).
        #[arg(long)]
        url: Option<String>,

        /// Content brief for the product being pitched.
        #[arg(long)]
        brief: Option<String>,
    },

    /// Resume a suspended run with an approval decision.
    Resume {
        /// Run UUID.
        run_id: String,

        /// Decision token; only 'yes' (any case) approves.
        decision: String,
    },

    /// Show a run's status and conversation.
    Status {
        /// Run UUID.
        run_id: String,
    },

    /// List recent runs.
    #[command(alias = "ls")]
    List {
        /// Maximum number of runs to display.
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Show only runs awaiting approval.
        #[arg(long)]
        suspended: bool,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Host to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}
