//! # CLI
//!
//! This module defines the command-line interface of `tabula` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring headers are `key:value`).
//! Connection settings can also come from `TABULA_*` environment variables.
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tabula", version, about = "Resilient table service client")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct ConnectionArgs {
    /// The server URL to connect to (e.g. http://localhost:8086)
    #[arg(long, env = "TABULA_URL")]
    pub url: String,

    /// Full table name (projects/<project>/instances/<instance>/tables/<table>)
    #[arg(long, env = "TABULA_TABLE")]
    pub table: String,

    /// App profile used to route the requests
    #[arg(long, env = "TABULA_APP_PROFILE", default_value = "")]
    pub app_profile: String,

    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Give up after this many failed attempts instead of retrying for up to 10 minutes
    #[arg(long, env = "TABULA_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Log every RPC and its outcome (shown with RUST_LOG=tabula_core=debug)
    #[arg(long)]
    pub trace_rpc: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write one cell
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// tabula --url http://localhost:8086 --table projects/p/instances/i/tables/t set-cell user#42 profile name Ada
    /// ```
    SetCell {
        row_key: String,
        family: String,
        column: String,
        value: String,
        /// Cell timestamp in microseconds. The server assigns one when omitted, which makes
        /// the write non-retryable.
        #[arg(long)]
        timestamp: Option<i64>,
    },

    /// Delete a whole row
    DeleteRow { row_key: String },

    /// Read a single row
    ReadRow {
        row_key: String,
        /// Only return cells whose family matches this regular expression
        #[arg(long)]
        family: Option<String>,
    },

    /// Scan a range of rows in key order
    ReadRows {
        /// First key of the scan (inclusive)
        #[arg(long, conflicts_with = "prefix")]
        start: Option<String>,
        /// Last key of the scan (exclusive)
        #[arg(long, conflicts_with = "prefix")]
        end: Option<String>,
        /// Only scan rows whose key starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Stop after this many rows
        #[arg(long)]
        limit: Option<u64>,
        /// Only return the latest N versions of each column
        #[arg(long)]
        latest: Option<i32>,
    },
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "Format must be 'key:value'".to_string())
}
