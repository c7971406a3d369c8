use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{RateTable, SourceCountry};
use crate::config::Config;
use crate::error::{Error, Result};

pub const COUNTRIES_SOURCE: &str = "Countries API";
pub const RATES_SOURCE: &str = "Exchange rates API";

/// Read-only access to the two upstream datasets
#[async_trait]
pub trait ExternalSources: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<SourceCountry>>;

    async fn fetch_rates(&self) -> Result<RateTable>;
}

/// Fetch both datasets concurrently. The first failure wins.
pub async fn fetch_all(sources: &dyn ExternalSources) -> Result<(Vec<SourceCountry>, RateTable)> {
    tokio::try_join!(sources.fetch_countries(), sources.fetch_rates())
}

/// HTTP implementation backed by the configured endpoints
pub struct SourceClient {
    client: Client,
    countries_url: String,
    rates_url: String,
}

impl SourceClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            countries_url: config.countries_url.clone(),
            rates_url: config.rates_url.clone(),
        })
    }

    async fn get_json(&self, url: &str, endpoint: &'static str) -> Result<Value> {
        debug!(%url, endpoint, "fetching");

        let result = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            response.json::<Value>().await
        }
        .await;

        result.map_err(|e| {
            let reason = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            warn!(%url, endpoint, %reason, "external source failed");
            Error::unavailable(endpoint, reason)
        })
    }
}

#[async_trait]
impl ExternalSources for SourceClient {
    async fn fetch_countries(&self) -> Result<Vec<SourceCountry>> {
        let payload = self.get_json(&self.countries_url, COUNTRIES_SOURCE).await?;
        let countries: Vec<SourceCountry> = serde_json::from_value(payload)
            .map_err(|e| Error::unavailable(COUNTRIES_SOURCE, format!("unexpected payload: {}", e)))?;

        debug!(count = countries.len(), "fetched countries");
        Ok(countries)
    }

    async fn fetch_rates(&self) -> Result<RateTable> {
        let payload = self.get_json(&self.rates_url, RATES_SOURCE).await?;
        let rates = RateTable::from_payload(&payload)
            .ok_or_else(|| Error::unavailable(RATES_SOURCE, "payload has no rates mapping"))?;

        debug!(count = rates.len(), "fetched exchange rates");
        Ok(rates)
    }
}
