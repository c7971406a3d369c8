use chrono::{DateTime, Utc};
use serde::Serialize;

/// A persisted country, as returned by the read endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRecord {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub name_lower: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<i64>,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

/// A derived row ready to be upserted, keyed by `name_lower`
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRow {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<i64>,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl CountryRow {
    pub fn name_lower(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Lookup key for a display name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
