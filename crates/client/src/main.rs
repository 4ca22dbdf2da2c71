//! stockroom CLI entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use stockroom_cache::{CacheConfig, QueryCache};
use stockroom_client::cli::products::{new_product, product_patch, ProductsAction};
use stockroom_client::cli::watch::WatchTarget;
use stockroom_client::cli::{Cli, Commands, OutputFormat};
use stockroom_client::output::{format_output, format_snapshot, pretty};
use stockroom_client::{HttpTransport, InventoryApi};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockroom=info,stockroom_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let transport = match &cli.base_url {
        Some(base_url) => HttpTransport::new(base_url.as_str()),
        None => HttpTransport::from_env(),
    };
    tracing::debug!(base_url = transport.base_url(), "Using API");
    let cache = QueryCache::new(Arc::new(transport), CacheConfig::from_env());
    let api = InventoryApi::new(cache);

    match cli.command {
        Commands::Products(products_cmd) => match products_cmd.action {
            ProductsAction::List { search } => {
                let products = api.products(search.as_deref()).await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_output(&products, cli.format)),
                    OutputFormat::Pretty => println!("{}", pretty::format_products(&products)),
                }
            }
            ProductsAction::Create {
                name,
                price,
                stock_quantity,
                rating,
            } => {
                let product = api
                    .create_product(&new_product(name, price, stock_quantity, rating))
                    .await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_output(&product, cli.format)),
                    OutputFormat::Pretty => {
                        println!("Created:\n{}", pretty::format_product(&product))
                    }
                }
            }
            ProductsAction::Update {
                id,
                name,
                price,
                stock_quantity,
                rating,
            } => {
                let patch = product_patch(name, price, stock_quantity, rating);
                if patch.is_empty() {
                    anyhow::bail!("Nothing to update: pass at least one field");
                }
                let product = api.update_product(&id, &patch).await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_output(&product, cli.format)),
                    OutputFormat::Pretty => {
                        println!("Updated:\n{}", pretty::format_product(&product))
                    }
                }
            }
            ProductsAction::Delete { id } => {
                let response = api.delete_product(&id).await?;
                match cli.format {
                    OutputFormat::Json => println!("{}", format_output(&response, cli.format)),
                    OutputFormat::Pretty if !cli.quiet => println!("Deleted product {}", id),
                    OutputFormat::Pretty => {}
                }
            }
        },
        Commands::Dashboard => {
            let metrics = api.dashboard_metrics().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&metrics, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_dashboard(&metrics)),
            }
        }
        Commands::Users => {
            let users = api.users().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&users, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_users(&users)),
            }
        }
        Commands::Expenses => {
            let expenses = api.expenses_by_category().await?;
            match cli.format {
                OutputFormat::Json => println!("{}", format_output(&expenses, cli.format)),
                OutputFormat::Pretty => println!("{}", pretty::format_expenses(&expenses)),
            }
        }
        Commands::Watch(watch_cmd) => match watch_cmd.target {
            WatchTarget::Products { search, interval } => {
                if !cli.quiet {
                    eprintln!("Watching products... (Ctrl+C to stop)");
                }
                let collector = api.cache().spawn_collector();
                let mut subscription = api.watch_products(search.as_deref())?;
                let mut poll =
                    interval.map(|secs| tokio::time::interval(Duration::from_secs(secs.max(1))));
                loop {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("Stopping watch");
                            break;
                        }
                        _ = next_poll(poll.as_mut()) => {
                            api.cache().refetch(subscription.key())?;
                        }
                        snapshot = subscription.next() => {
                            let Some(snapshot) = snapshot else { break };
                            println!("{}", format_snapshot(&snapshot, cli.format));
                        }
                    }
                }
                subscription.unsubscribe();
                collector.shutdown().await;
            }
        },
    }

    Ok(())
}

/// Ticks `poll` if polling is enabled; otherwise never completes.
async fn next_poll(poll: Option<&mut tokio::time::Interval>) {
    match poll {
        Some(poll) => {
            poll.tick().await;
        }
        None => std::future::pending().await,
    }
}
