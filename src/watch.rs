//! Refresh driver: a timer loop that re-runs the full valuation pass.

use anyhow::Result;
use chrono::Local;
use console::Term;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::fx::FxRateCache;
use crate::portfolio::PortfolioStore;
use crate::resolver::QuoteResolver;
use crate::ui;
use crate::valuation;

/// Runs valuation passes forever at `refresh` intervals, redrawing the
/// terminal after each pass. Every tick re-resolves every holding; there
/// is no partial update.
pub async fn watch(
    store: &PortfolioStore,
    resolver: &QuoteResolver,
    fx: &FxRateCache,
    refresh: Duration,
    lookup_timeout: Option<Duration>,
) -> Result<()> {
    let term = Term::stdout();
    let mut ticker = interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let holdings = store.snapshot();
        debug!("Refresh tick with {} holdings", holdings.len());

        let pb = ui::new_progress_bar(holdings.len() as u64, true);
        pb.set_message("Refreshing quotes...");
        let valuation =
            valuation::value_portfolio(&holdings, resolver, fx, lookup_timeout, pb).await;

        term.clear_screen()?;
        println!(
            "{}  {}\n",
            ui::style_text("Portfolio", ui::StyleType::Title),
            ui::style_text(
                &format!("refreshed {}", Local::now().format("%H:%M:%S")),
                ui::StyleType::Subtle
            )
        );
        println!("{}", valuation.display_as_table());
    }
}
