//! Watch CLI commands.

use clap::{Parser, Subcommand};

/// Live query commands.
#[derive(Debug, Parser)]
pub struct WatchCommand {
    #[command(subcommand)]
    pub target: WatchTarget,
}

/// Queries that can be watched.
#[derive(Debug, Subcommand)]
pub enum WatchTarget {
    /// Print every state change of a product list until Ctrl+C.
    Products {
        /// Filter by name.
        #[arg(long)]
        search: Option<String>,
        /// Also refetch every N seconds.
        #[arg(long)]
        interval: Option<u64>,
    },
}
