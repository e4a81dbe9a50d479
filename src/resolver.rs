//! Symbol resolution: an ordered cascade over the crypto and equity sources.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::quote::{Currency, EquitySource, InstrumentInfo, MarketStatus, Quote, SpotPriceSource};

/// Domestic listing venues, in lookup order: KOSPI then KOSDAQ.
const DOMESTIC_SUFFIXES: [&str; 2] = [".KS", ".KQ"];

/// Resolves a free-form symbol to a [`Quote`]. Sources are tried in a
/// fixed order and the first usable price wins; every source failure
/// degrades to "no price here", never to an error.
pub struct QuoteResolver {
    spot: Arc<dyn SpotPriceSource>,
    equity: Arc<dyn EquitySource>,
}

impl QuoteResolver {
    pub fn new(spot: Arc<dyn SpotPriceSource>, equity: Arc<dyn EquitySource>) -> Self {
        QuoteResolver { spot, equity }
    }

    #[instrument(name = "ResolveSymbol", skip(self), fields(symbol = %symbol))]
    pub async fn resolve(&self, symbol: &str) -> Quote {
        let symbol = symbol.to_uppercase();

        // 1. Coin check: Upbit lists KRW markets as KRW-<SYM>.
        let market = format!("KRW-{symbol}");
        match self.spot.spot_price(&market).await {
            Ok(Some(price)) if price > 0.0 => {
                debug!("Resolved {} as crypto at {}", symbol, price);
                return Quote {
                    price,
                    currency: Currency::Krw,
                    status: MarketStatus::Crypto,
                };
            }
            Ok(_) => debug!("No spot price for {}", market),
            Err(e) => debug!("Spot lookup failed for {}: {}", market, e),
        }

        // 2. Equity check: bare ticker first, then the KOSPI/KOSDAQ
        //    suffix variants. First candidate with a price wins.
        for candidate in Self::equity_candidates(&symbol) {
            let info = match self.equity.instrument_info(&candidate).await {
                Ok(info) => info,
                Err(e) => {
                    debug!("Instrument lookup failed for {}: {}", candidate, e);
                    continue;
                }
            };

            if let Some(quote) = Self::quote_from_info(&candidate, &info) {
                debug!(
                    "Resolved {} via {} at {} {}",
                    symbol, candidate, quote.price, quote.currency
                );
                return quote;
            }
            debug!("No usable price in instrument info for {}", candidate);
        }

        debug!("Could not resolve {}", symbol);
        Quote::unresolved()
    }

    fn equity_candidates(symbol: &str) -> Vec<String> {
        let mut candidates = vec![symbol.to_string()];
        for suffix in DOMESTIC_SUFFIXES {
            candidates.push(format!("{symbol}{suffix}"));
        }
        candidates
    }

    /// Price selection is field-priority, not timestamp-priority: a
    /// pre-market price always beats the regular price and the previous
    /// close when present.
    fn quote_from_info(candidate: &str, info: &InstrumentInfo) -> Option<Quote> {
        let positive = |p: Option<f64>| p.filter(|v| *v > 0.0);

        let pre_market = positive(info.pre_market_price);
        let price = pre_market
            .or_else(|| positive(info.regular_market_price))
            .or_else(|| positive(info.previous_close))?;

        let currency = if Self::is_domestic(candidate) {
            Currency::Krw
        } else {
            Currency::Usd
        };
        let status = if pre_market.is_some() {
            MarketStatus::PreMarket
        } else {
            MarketStatus::Regular
        };

        Some(Quote {
            price,
            currency,
            status,
        })
    }

    /// A ticker is domestic iff it ends with a recognized venue suffix.
    fn is_domestic(ticker: &str) -> bool {
        DOMESTIC_SUFFIXES.iter().any(|s| ticker.ends_with(s))
    }
}
