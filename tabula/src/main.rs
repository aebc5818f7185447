//! # Tabula CLI Entry Point
//!
//! The main executable for the Tabula tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the log subscriber.
//! 2. **Connection**: Builds a `Table` through `tabula_core`, connecting lazily on the first RPC.
//! 3. **Execution**: Runs the requested operation with the blocking API.
//! 4. **Presentation**: Formats and prints the resulting rows or error status.

mod cli;
mod formatter;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, ConnectionArgs};
use formatter::{FormattedString, RowLookup};
use tabula_core::{
    completion::CompletionQueue,
    filter::Filter,
    mutation::{CellTimestamp, SingleRowMutation, delete_from_row, set_cell},
    policy::LimitedErrorCountRetryPolicy,
    row_set::{RowRange, RowSet},
    table::{RPC_TRACING_COMPONENT, Table, TableOptions},
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let table = connect(args.connection)?;

    match args.command {
        Commands::SetCell {
            row_key,
            family,
            column,
            value,
            timestamp,
        } => {
            let timestamp = timestamp.map_or(CellTimestamp::ServerAssigned, CellTimestamp::Micros);
            let mutation =
                SingleRowMutation::new(row_key, [set_cell(family, column, timestamp, value)]);
            table.apply(mutation).context("set-cell failed")?;
        }
        Commands::DeleteRow { row_key } => {
            let mutation = SingleRowMutation::new(row_key, [delete_from_row()]);
            table.apply(mutation).context("delete-row failed")?;
        }
        Commands::ReadRow { row_key, family } => {
            let filter = family.map_or(Filter::PassAll, Filter::FamilyRegex);
            let (found, row) = table.read_row(row_key, filter).context("read-row failed")?;
            print!("{}", FormattedString::from(RowLookup(found, row)));
        }
        Commands::ReadRows {
            start,
            end,
            prefix,
            limit,
            latest,
        } => {
            let row_set = scan_range(start, end, prefix);
            let filter = latest.map_or(Filter::PassAll, Filter::Latest);
            let reader = match limit {
                Some(limit) => table.read_rows_with_limit(row_set, limit, filter),
                None => table.read_rows(row_set, filter),
            };

            for row in reader.blocking(table.completion_queue()) {
                match row {
                    Ok(row) => print!("{}", FormattedString::from(&row)),
                    Err(status) => {
                        eprint!("{}", FormattedString::from(status));
                        std::process::exit(1);
                    }
                }
            }
        }
    }

    Ok(())
}

fn connect(args: ConnectionArgs) -> anyhow::Result<Table> {
    let mut options = TableOptions::new().with_app_profile_id(args.app_profile);
    for (key, value) in args.headers {
        options = options.with_header(key, value);
    }
    if let Some(max_attempts) = args.max_attempts {
        options = options.with_retry_policy(LimitedErrorCountRetryPolicy::new(max_attempts));
    }
    if args.trace_rpc {
        options = options.enable_tracing(RPC_TRACING_COMPONENT);
    }

    let completion_queue = CompletionQueue::new(2)?;
    let table = Table::connect_lazy(&args.url, args.table, options, completion_queue)
        .with_context(|| format!("Failed to set up a client for '{}'", args.url))?;
    Ok(table)
}

fn scan_range(start: Option<String>, end: Option<String>, prefix: Option<String>) -> RowSet {
    use std::ops::Bound;

    if let Some(prefix) = prefix {
        return RowRange::prefix(prefix).into();
    }

    let start = start.map_or(Bound::Unbounded, |key| Bound::Included(key.into()));
    let end = end.map_or(Bound::Unbounded, |key| Bound::Excluded(key.into()));
    RowRange::new(start, end).into()
}
