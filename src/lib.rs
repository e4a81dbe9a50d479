pub mod config;
pub mod fx;
pub mod log;
pub mod portfolio;
pub mod providers;
pub mod quote;
pub mod resolver;
pub mod ui;
pub mod valuation;
pub mod watch;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::fx::FxRateCache;
use crate::portfolio::PortfolioStore;
use crate::providers::upbit::UpbitProvider;
use crate::providers::yahoo::{YahooCurrencyProvider, YahooQuoteProvider};
use crate::resolver::QuoteResolver;

#[derive(Debug, Clone, Copy)]
pub enum AppCommand {
    /// One valuation pass, then exit
    Summary,
    /// Re-value on a timer until interrupted
    Watch,
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    holding_overrides: &[(String, f64)],
) -> Result<()> {
    info!("Portfolio tracker starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = PortfolioStore::from_seed(&config.holdings);
    for (symbol, count) in holding_overrides {
        store.upsert(symbol, *count);
    }

    if store.is_empty() {
        println!("No holdings configured. Add some to the config file or pass --holding SYM=COUNT.");
        return Ok(());
    }

    let spot = Arc::new(UpbitProvider::new(config.upbit_base_url()));
    let equity = Arc::new(YahooQuoteProvider::new(config.yahoo_base_url()));
    let resolver = QuoteResolver::new(spot, equity);

    let rate_source = Arc::new(YahooCurrencyProvider::new(config.yahoo_base_url()));
    let fx = FxRateCache::new(
        rate_source,
        Duration::from_secs(config.fx.ttl_secs),
        config.fx.default_rate,
    );

    let lookup_timeout = match config.lookup_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    match command {
        AppCommand::Summary => {
            let holdings = store.snapshot();
            let pb = ui::new_progress_bar(holdings.len() as u64, true);
            pb.set_message("Fetching quotes...");
            let valuation =
                valuation::value_portfolio(&holdings, &resolver, &fx, lookup_timeout, pb).await;
            println!("{}", valuation.display_as_table());
            Ok(())
        }
        AppCommand::Watch => {
            watch::watch(
                &store,
                &resolver,
                &fx,
                Duration::from_secs(config.refresh_secs),
                lookup_timeout,
            )
            .await
        }
    }
}
