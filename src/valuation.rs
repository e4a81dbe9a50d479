//! Per-cycle valuation: resolve every holding, convert to KRW and sum.

use comfy_table::Cell;
use futures::future::join_all;
use indicatif::ProgressBar;
use std::time::Duration;
use tracing::debug;

use crate::fx::FxRateCache;
use crate::portfolio::Holding;
use crate::quote::{Currency, MarketStatus, Quote};
use crate::resolver::QuoteResolver;
use crate::ui;

/// One row of the valuation report.
#[derive(Debug, Clone)]
pub struct AssetValuation {
    pub symbol: String,
    pub status: MarketStatus,
    pub count: f64,
    pub price: f64,
    pub currency: Currency,
    pub value_krw: f64,
}

/// Result of one full valuation pass. `rate` is the single USD→KRW
/// snapshot every row of this pass was converted with.
#[derive(Debug)]
pub struct PortfolioValuation {
    pub assets: Vec<AssetValuation>,
    pub total_krw: f64,
    pub rate: f64,
}

/// Values all holdings with one shared FX snapshot. Lookups fan out
/// concurrently; output order matches input order. Unresolved and
/// zero-count holdings stay in the output and contribute 0.
pub async fn value_portfolio(
    holdings: &[Holding],
    resolver: &QuoteResolver,
    fx: &FxRateCache,
    lookup_timeout: Option<Duration>,
    pb: ProgressBar,
) -> PortfolioValuation {
    let rate = fx.get_rate().await;
    debug!("Valuing {} holdings at USD/KRW {}", holdings.len(), rate);

    let quote_futures = holdings.iter().map(|holding| {
        let pb = pb.clone();
        async move {
            let quote = match lookup_timeout {
                Some(limit) => tokio::time::timeout(limit, resolver.resolve(&holding.symbol))
                    .await
                    .unwrap_or_else(|_| {
                        debug!("Lookup timed out for {}", holding.symbol);
                        Quote::unresolved()
                    }),
                None => resolver.resolve(&holding.symbol).await,
            };
            pb.inc(1);
            quote
        }
    });

    let quotes = join_all(quote_futures).await;
    pb.finish_and_clear();

    let mut assets = Vec::with_capacity(holdings.len());
    let mut total_krw = 0.0;

    for (holding, quote) in holdings.iter().zip(quotes) {
        let price_krw = match quote.currency {
            Currency::Krw => quote.price,
            Currency::Usd => quote.price * rate,
        };
        let value_krw = price_krw * holding.count;
        total_krw += value_krw;

        assets.push(AssetValuation {
            symbol: holding.symbol.clone(),
            status: quote.status,
            count: holding.count,
            price: quote.price,
            currency: quote.currency,
            value_krw,
        });
    }

    PortfolioValuation {
        assets,
        total_krw,
        rate,
    }
}

impl PortfolioValuation {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Symbol"),
            ui::header_cell("Status"),
            ui::header_cell("Units"),
            ui::header_cell("Price"),
            ui::header_cell("Value (KRW)"),
        ]);

        for asset in &self.assets {
            let (price, value) = if asset.status == MarketStatus::Unresolved {
                (ui::unresolved_cell(), ui::unresolved_cell())
            } else {
                (
                    ui::value_cell(format!("{:.2} {}", asset.price, asset.currency)),
                    ui::value_cell(format!("₩{}", ui::group_thousands(asset.value_krw))),
                )
            };

            table.add_row(vec![
                Cell::new(&asset.symbol),
                Cell::new(asset.status.to_string()),
                ui::value_cell(format!("{:.4}", asset.count)),
                price,
                value,
            ]);
        }

        let mut output = table.to_string();
        output.push_str(&format!(
            "\n\n{}: {}   {}",
            ui::style_text("Total Value (KRW)", ui::StyleType::TotalLabel),
            ui::style_text(
                &format!("₩{}", ui::group_thousands(self.total_krw)),
                ui::StyleType::TotalValue
            ),
            ui::style_text(
                &format!("USD/KRW {:.1}", self.rate),
                ui::StyleType::Subtle
            ),
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{
        CurrencyRateSource, EquitySource, InstrumentInfo, SpotPriceSource,
    };
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSpot(HashMap<String, f64>);

    #[async_trait]
    impl SpotPriceSource for FixedSpot {
        async fn spot_price(&self, market: &str) -> Result<Option<f64>> {
            Ok(self.0.get(market).copied())
        }
    }

    struct FixedEquity(HashMap<String, InstrumentInfo>);

    #[async_trait]
    impl EquitySource for FixedEquity {
        async fn instrument_info(&self, ticker: &str) -> Result<InstrumentInfo> {
            self.0
                .get(ticker)
                .cloned()
                .ok_or_else(|| anyhow!("No quote data found for ticker: {}", ticker))
        }
    }

    struct SlowEquity;

    #[async_trait]
    impl EquitySource for SlowEquity {
        async fn instrument_info(&self, _ticker: &str) -> Result<InstrumentInfo> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(InstrumentInfo::default())
        }
    }

    struct CountingRate {
        rate: f64,
        call_count: AtomicUsize,
    }

    #[async_trait]
    impl CurrencyRateSource for Arc<CountingRate> {
        async fn get_rate(&self, _from: &str, _to: &str) -> Result<f64> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            Ok(self.rate)
        }
    }

    fn fx_with_rate(rate: f64) -> (FxRateCache, Arc<CountingRate>) {
        let source = Arc::new(CountingRate {
            rate,
            call_count: AtomicUsize::new(0),
        });
        let fx = FxRateCache::new(
            Arc::new(Arc::clone(&source)),
            Duration::from_secs(600),
            1350.0,
        );
        (fx, source)
    }

    fn holdings(list: &[(&str, f64)]) -> Vec<Holding> {
        list.iter()
            .map(|(s, c)| Holding {
                symbol: s.to_string(),
                count: *c,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_mixed_portfolio_total() {
        // BTC resolves as crypto in KRW, AAPL as a foreign equity.
        let spot = FixedSpot(HashMap::from([("KRW-BTC".to_string(), 100_000_000.0)]));
        let equity = FixedEquity(HashMap::from([(
            "AAPL".to_string(),
            InstrumentInfo {
                regular_market_price: Some(200.0),
                ..Default::default()
            },
        )]));
        let resolver = QuoteResolver::new(Arc::new(spot), Arc::new(equity));
        let (fx, _) = fx_with_rate(1300.0);

        let valuation = value_portfolio(
            &holdings(&[("BTC", 0.5), ("AAPL", 10.0)]),
            &resolver,
            &fx,
            None,
            ui::new_progress_bar(2, false),
        )
        .await;

        // 0.5 * 100,000,000 + 10 * 200 * 1300
        assert_eq!(valuation.total_krw, 52_600_000.0);
        assert_eq!(valuation.rate, 1300.0);
        assert_eq!(valuation.assets.len(), 2);
        assert_eq!(valuation.assets[0].symbol, "BTC");
        assert_eq!(valuation.assets[0].value_krw, 50_000_000.0);
        assert_eq!(valuation.assets[0].currency, Currency::Krw);
        assert_eq!(valuation.assets[1].symbol, "AAPL");
        assert_eq!(valuation.assets[1].value_krw, 2_600_000.0);
        assert_eq!(valuation.assets[1].currency, Currency::Usd);
    }

    #[tokio::test]
    async fn test_single_rate_snapshot_per_pass() {
        let equity = FixedEquity(HashMap::from([
            (
                "AAPL".to_string(),
                InstrumentInfo {
                    regular_market_price: Some(200.0),
                    ..Default::default()
                },
            ),
            (
                "MSFT".to_string(),
                InstrumentInfo {
                    regular_market_price: Some(400.0),
                    ..Default::default()
                },
            ),
        ]));
        let resolver = QuoteResolver::new(Arc::new(FixedSpot(HashMap::new())), Arc::new(equity));
        let (fx, source) = fx_with_rate(1300.0);

        value_portfolio(
            &holdings(&[("AAPL", 1.0), ("MSFT", 1.0)]),
            &resolver,
            &fx,
            None,
            ui::new_progress_bar(2, false),
        )
        .await;

        assert_eq!(source.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unresolved_holding_stays_in_output() {
        let spot = FixedSpot(HashMap::from([("KRW-BTC".to_string(), 100_000_000.0)]));
        let resolver =
            QuoteResolver::new(Arc::new(spot), Arc::new(FixedEquity(HashMap::new())));
        let (fx, _) = fx_with_rate(1300.0);

        let valuation = value_portfolio(
            &holdings(&[("BTC", 0.5), ("XXX", 3.0)]),
            &resolver,
            &fx,
            None,
            ui::new_progress_bar(2, false),
        )
        .await;

        assert_eq!(valuation.assets.len(), 2);
        assert_eq!(valuation.assets[1].symbol, "XXX");
        assert_eq!(valuation.assets[1].status, MarketStatus::Unresolved);
        assert_eq!(valuation.assets[1].value_krw, 0.0);
        // The unresolved row must not perturb the total.
        assert_eq!(valuation.total_krw, 50_000_000.0);
    }

    #[tokio::test]
    async fn test_zero_count_contributes_nothing() {
        let spot = FixedSpot(HashMap::from([("KRW-ETH".to_string(), 5_000_000.0)]));
        let resolver =
            QuoteResolver::new(Arc::new(spot), Arc::new(FixedEquity(HashMap::new())));
        let (fx, _) = fx_with_rate(1300.0);

        let valuation = value_portfolio(
            &holdings(&[("ETH", 0.0)]),
            &resolver,
            &fx,
            None,
            ui::new_progress_bar(1, false),
        )
        .await;

        assert_eq!(valuation.assets.len(), 1);
        assert_eq!(valuation.assets[0].price, 5_000_000.0);
        assert_eq!(valuation.assets[0].value_krw, 0.0);
        assert_eq!(valuation.total_krw, 0.0);
    }

    #[tokio::test]
    async fn test_lookup_timeout_maps_to_unresolved() {
        let resolver =
            QuoteResolver::new(Arc::new(FixedSpot(HashMap::new())), Arc::new(SlowEquity));
        let (fx, _) = fx_with_rate(1300.0);

        let valuation = value_portfolio(
            &holdings(&[("AAPL", 10.0)]),
            &resolver,
            &fx,
            Some(Duration::from_millis(20)),
            ui::new_progress_bar(1, false),
        )
        .await;

        assert_eq!(valuation.assets[0].status, MarketStatus::Unresolved);
        assert_eq!(valuation.total_krw, 0.0);
    }

    #[tokio::test]
    async fn test_output_preserves_holding_order() {
        let spot = FixedSpot(HashMap::from([
            ("KRW-BTC".to_string(), 100_000_000.0),
            ("KRW-ETH".to_string(), 5_000_000.0),
        ]));
        let resolver =
            QuoteResolver::new(Arc::new(spot), Arc::new(FixedEquity(HashMap::new())));
        let (fx, _) = fx_with_rate(1300.0);

        let valuation = value_portfolio(
            &holdings(&[("ETH", 1.0), ("ZZZ", 1.0), ("BTC", 1.0)]),
            &resolver,
            &fx,
            None,
            ui::new_progress_bar(3, false),
        )
        .await;

        let symbols: Vec<&str> = valuation.assets.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "ZZZ", "BTC"]);
    }

    #[tokio::test]
    async fn test_display_as_table_marks_unresolved() {
        let resolver = QuoteResolver::new(
            Arc::new(FixedSpot(HashMap::new())),
            Arc::new(FixedEquity(HashMap::new())),
        );
        let (fx, _) = fx_with_rate(1300.0);

        let valuation = value_portfolio(
            &holdings(&[("XXX", 1.0)]),
            &resolver,
            &fx,
            None,
            ui::new_progress_bar(1, false),
        )
        .await;

        let rendered = valuation.display_as_table();
        assert!(rendered.contains("XXX"));
        assert!(rendered.contains("Unresolved"));
        assert!(rendered.contains("N/A"));
        assert!(rendered.contains("₩0"));
    }
}
