//! USD→KRW rate cache with a bounded TTL and a never-fail contract.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::quote::CurrencyRateSource;

struct CachedRate {
    rate: f64,
    fetched_at: Instant,
}

/// Memoizes the USD→KRW rate for `ttl`. `get_rate` never fails: a fetch
/// failure falls back to the last cached value, or to `default_rate` if
/// nothing has ever been fetched.
pub struct FxRateCache {
    source: Arc<dyn CurrencyRateSource>,
    ttl: Duration,
    default_rate: f64,
    state: Mutex<Option<CachedRate>>,
}

impl FxRateCache {
    pub fn new(source: Arc<dyn CurrencyRateSource>, ttl: Duration, default_rate: f64) -> Self {
        FxRateCache {
            source,
            ttl,
            default_rate,
            state: Mutex::new(None),
        }
    }

    pub async fn get_rate(&self) -> f64 {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!("FX cache HIT: {}", cached.rate);
                return cached.rate;
            }
            debug!("FX cache entry expired");
        }

        match self.source.get_rate("USD", "KRW").await {
            Ok(rate) if rate > 0.0 => {
                debug!("Fetched USD/KRW rate: {}", rate);
                *state = Some(CachedRate {
                    rate,
                    fetched_at: Instant::now(),
                });
                rate
            }
            Ok(rate) => {
                warn!("Ignoring non-positive USD/KRW rate: {}", rate);
                state.as_ref().map_or(self.default_rate, |c| c.rate)
            }
            Err(e) => {
                warn!("USD/KRW rate fetch failed, using fallback: {}", e);
                // Stale beats nothing. The expired entry is kept so a flaky
                // source keeps serving the last known rate.
                state.as_ref().map_or(self.default_rate, |c| c.rate)
            }
        }
    }
}
