use std::collections::HashMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::{
    config::MarketConfig,
    error::{MaintenanceError, Result},
};

/// Provides BTC exchange rates for fiat currencies.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// One rate per requested code, in the same order. `NaN` marks a
    /// currency for which no rate was found.
    async fn rates(&self, codes: &[String]) -> Result<Vec<f64>>;
}

/// Reads a flat JSON object of `{"USD": 65000.0, ...}` from a URL.
pub struct JsonRateSource {
    client: reqwest::Client,
    url: String,
}

impl JsonRateSource {
    pub fn new(config: &MarketConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.rates_url.clone(),
        }
    }
}

#[async_trait]
impl ExchangeRateSource for JsonRateSource {
    async fn rates(&self, codes: &[String]) -> Result<Vec<f64>> {
        let table: HashMap<String, serde_json::Value> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if table.is_empty() {
            return Err(MaintenanceError::RateSource(format!("no rates at {}", self.url)));
        }
        debug!("Fetched {} rates from {}", table.len(), self.url);

        Ok(codes
            .iter()
            .map(|code| table.get(code).and_then(|v| v.as_f64()).unwrap_or(f64::NAN))
            .collect())
    }
}
