use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::{MaintenanceError, Result},
    market::source::ExchangeRateSource,
    storage::{models::CachedPrice, ports::PriceStore},
};

/// Supported fiat currencies keyed by their stored id.
pub const CURRENCIES: [(i64, &str); 15] = [
    (1, "USD"),
    (2, "EUR"),
    (3, "JPY"),
    (4, "GBP"),
    (5, "AUD"),
    (6, "CAD"),
    (7, "CNY"),
    (8, "CHF"),
    (9, "SEK"),
    (10, "NZD"),
    (11, "KRW"),
    (12, "TRY"),
    (13, "RUB"),
    (14, "ZAR"),
    (15, "BRL"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub code: String,
    pub rate: f64,
    pub cached: bool,
}

pub type PriceCacheSummary = BTreeMap<i64, PriceQuote>;

/// Refreshes the cached exchange rate of every supported currency.
pub struct MarketPriceCache<'a, S: PriceStore + ?Sized, X: ExchangeRateSource + ?Sized> {
    store: &'a S,
    source: &'a X,
}

impl<'a, S: PriceStore + ?Sized, X: ExchangeRateSource + ?Sized> MarketPriceCache<'a, S, X> {
    pub fn new(store: &'a S, source: &'a X) -> Self {
        Self { store, source }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<PriceCacheSummary> {
        let codes: Vec<String> = CURRENCIES.iter().map(|(_, code)| code.to_string()).collect();
        let rates = self.source.rates(&codes).await?;
        if rates.len() != codes.len() {
            return Err(MaintenanceError::RateSource(format!(
                "expected {} rates, got {}",
                codes.len(),
                rates.len()
            )));
        }

        let mut summary = PriceCacheSummary::new();
        for ((currency_id, code), rate) in CURRENCIES.iter().zip(rates) {
            // Keep the previous price when no new rate was found.
            let cached = !rate.is_nan();
            if cached {
                self.store.upsert_price(&CachedPrice {
                    currency_id: *currency_id,
                    code: code.to_string(),
                    exchange_rate: rate,
                    timestamp: now,
                })?;
            } else {
                warn!("No rate found for {}", code);
            }

            summary.insert(
                *currency_id,
                PriceQuote {
                    code: code.to_string(),
                    rate,
                    cached,
                },
            );
        }

        info!(
            "Cached {} of {} prices",
            summary.values().filter(|q| q.cached).count(),
            summary.len()
        );
        Ok(summary)
    }
}
