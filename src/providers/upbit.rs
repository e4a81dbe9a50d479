use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::quote::SpotPriceSource;

/// Spot-price adapter for the Upbit exchange ticker API.
pub struct UpbitProvider {
    base_url: String,
}

impl UpbitProvider {
    pub fn new(base_url: &str) -> Self {
        UpbitProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct UpbitTicker {
    trade_price: f64,
}

#[async_trait]
impl SpotPriceSource for UpbitProvider {
    #[instrument(
        name = "UpbitSpotFetch",
        skip(self),
        fields(market = %market)
    )]
    async fn spot_price(&self, market: &str) -> Result<Option<f64>> {
        let url = format!("{}/v1/ticker?markets={}", self.base_url, market);
        debug!("Requesting spot price from {}", url);

        let client = reqwest::Client::builder().user_agent("jasan/0.2").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for market: {} URL: {}", e, market, url))?;

        // Upbit answers 404 for markets it does not list. That is a
        // normal "not a coin" outcome, not a failure.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("Market {} not listed on Upbit", market);
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for market: {}",
                response.status(),
                market
            ));
        }

        let tickers = response.json::<Vec<UpbitTicker>>().await?;
        Ok(tickers.first().map(|t| t.trade_price))
    }
}
