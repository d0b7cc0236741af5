//! tickercache - market data from the command line, through a persistent cache
//!
//! Each subcommand fetches one API resource via the cache-aware client and
//! prints it as JSON. Logs go to stderr so stdout stays machine-readable.

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickercache::api::{ApiClient, MarketsQuery};
use tickercache::cli::{CacheAction, Cli, Command};
use tickercache::config::Config;

/// Initializes the tracing subscriber
///
/// Defaults to warnings from this crate; override with `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickercache=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Runs one command and returns the JSON to print
async fn run(command: &Command, client: &ApiClient, refresh: bool) -> Result<String, Box<dyn Error>> {
    let value = match command {
        Command::Markets {
            currency,
            page,
            per_page,
        } => {
            let query = MarketsQuery {
                currency: currency.clone(),
                page: *page,
                per_page: *per_page,
            };
            serde_json::to_value(client.markets(&query, refresh).await?)?
        }
        Command::Coin { id } => serde_json::to_value(client.coin_detail(id, refresh).await?)?,
        Command::Chart { id, currency, days } => {
            serde_json::to_value(client.market_chart(id, currency, *days, refresh).await?)?
        }
        Command::Global => serde_json::to_value(client.global_stats(refresh).await?)?,
        Command::Trending => serde_json::to_value(client.trending(refresh).await?)?,
        Command::Overview => {
            let query = MarketsQuery::default();
            let (global, trending, markets) = futures::try_join!(
                client.global_stats(refresh),
                client.trending(refresh),
                client.markets(&query, refresh),
            )?;
            json!({
                "global": global,
                "trending": trending,
                "markets": markets,
            })
        }
        Command::Cache { action } => {
            let cache = client.cache();
            match action {
                CacheAction::Stats => serde_json::to_value(cache.stats())?,
                CacheAction::Clear => json!({ "removed": cache.clear_all() }),
                CacheAction::Sweep => json!({ "removed": cache.sweep_expired() }),
                CacheAction::Invalidate { key } => {
                    cache.invalidate(key);
                    json!({ "invalidated": key })
                }
            }
        }
    };

    Ok(serde_json::to_string_pretty(&value)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env();
    let client = config.api_client();

    match run(&cli.command, &client, cli.refresh).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
