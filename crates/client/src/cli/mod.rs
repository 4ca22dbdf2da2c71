//! CLI command definitions.

pub mod products;
pub mod watch;

use clap::{Parser, Subcommand, ValueEnum};

/// CLI client for the stockroom inventory API.
#[derive(Debug, Parser)]
#[command(name = "stockroom")]
#[command(about = "CLI client for the stockroom inventory API", long_about = None)]
pub struct Cli {
    /// API base URL. Falls back to API_BASE_URL, then http://127.0.0.1:8000.
    #[arg(long, env = "STOCKROOM_API_URL")]
    pub base_url: Option<String>,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Product management.
    Products(products::ProductsCommand),
    /// Dashboard metrics.
    Dashboard,
    /// List users.
    Users,
    /// Expenses by category.
    Expenses,
    /// Follow a query live.
    Watch(watch::WatchCommand),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_products_list_with_search() {
        let cli = Cli::try_parse_from(["stockroom", "products", "list", "--search", "shoe"]).unwrap();
        match cli.command {
            Commands::Products(cmd) => match cmd.action {
                products::ProductsAction::List { search } => {
                    assert_eq!(search.as_deref(), Some("shoe"))
                }
                other => panic!("unexpected action {:?}", other),
            },
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_requires_id() {
        assert!(Cli::try_parse_from(["stockroom", "products", "update"]).is_err());
        let cli = Cli::try_parse_from([
            "stockroom",
            "--format",
            "json",
            "products",
            "update",
            "p1",
            "--price",
            "9.5",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn test_parse_watch_products() {
        let cli = Cli::try_parse_from(["stockroom", "watch", "products"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Watch(watch::WatchCommand {
                target: watch::WatchTarget::Products {
                    search: None,
                    interval: None
                }
            })
        ));
    }
}
