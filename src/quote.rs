//! Quote types and the source traits the resolver consumes

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Display;

/// Currency of a raw quote. The portfolio itself is always reported in KRW.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Krw,
    Usd,
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Currency::Krw => "KRW",
                Currency::Usd => "USD",
            }
        )
    }
}

/// Which source and session produced a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    Crypto,
    PreMarket,
    Regular,
    Unresolved,
}

impl Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MarketStatus::Crypto => "Crypto",
                MarketStatus::PreMarket => "Pre-market",
                MarketStatus::Regular => "Regular/Close",
                MarketStatus::Unresolved => "Unresolved",
            }
        )
    }
}

/// One resolved price for one symbol at one point in time. Never cached
/// across refresh cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub currency: Currency,
    pub status: MarketStatus,
}

impl Quote {
    /// Sentinel for a symbol no source could price. Price 0 means
    /// "unresolved", not "worthless".
    pub fn unresolved() -> Self {
        Quote {
            price: 0.0,
            currency: Currency::Krw,
            status: MarketStatus::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status != MarketStatus::Unresolved
    }
}

/// Instrument fields returned by the equity source. All optional; the
/// resolver applies the pre-market > regular > previous-close fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentInfo {
    pub pre_market_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
}

/// Spot-price lookup for a crypto market pair such as `KRW-BTC`.
/// `Ok(None)` means the pair is unknown to the exchange.
#[async_trait]
pub trait SpotPriceSource: Send + Sync {
    async fn spot_price(&self, market: &str) -> Result<Option<f64>>;
}

/// Instrument metadata lookup for an equity ticker.
#[async_trait]
pub trait EquitySource: Send + Sync {
    async fn instrument_info(&self, ticker: &str) -> Result<InstrumentInfo>;
}

#[async_trait]
pub trait CurrencyRateSource: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}
