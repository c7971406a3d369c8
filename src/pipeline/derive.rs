use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::ops::RangeInclusive;

use super::validate::{validate, Issue};
use crate::model::CountryRow;
use crate::sources::{RateTable, SourceCountry};

/// Bounds of the per-country random multiplier used by the GDP estimate
pub const MULTIPLIER_RANGE: RangeInclusive<u32> = 1000..=2000;

/// Rows derived from one refresh run
#[derive(Debug, Default)]
pub struct DerivedBatch {
    pub rows: Vec<CountryRow>,
    pub skipped: usize,
}

/// Estimated GDP for a country:
///
/// - no usable population: `None`, whatever the currency says
/// - no currency at all: `Some(0.0)`
/// - a currency the rate table does not know: `None`
/// - otherwise `population * multiplier / rate`
pub fn estimate_gdp<R: Rng + ?Sized>(
    population: Option<i64>,
    currency_code: Option<&str>,
    exchange_rate: Option<f64>,
    rng: &mut R,
) -> Option<f64> {
    let population = population?;

    match (currency_code, exchange_rate) {
        (None, _) => Some(0.0),
        (Some(_), None) => None,
        (Some(_), Some(rate)) => {
            let multiplier = rng.gen_range(MULTIPLIER_RANGE);
            Some(population as f64 * f64::from(multiplier) / rate)
        }
    }
}

/// Join one source country against the rate table. `name` is the validated,
/// trimmed display name.
pub fn derive_row<R: Rng + ?Sized>(
    name: String,
    country: &SourceCountry,
    rates: &RateTable,
    refreshed_at: DateTime<Utc>,
    rng: &mut R,
) -> CountryRow {
    let currency_code = country.currency_code().map(str::to_string);
    let exchange_rate = currency_code.as_deref().and_then(|code| rates.rate(code));
    let population = country.population();
    let estimated_gdp = estimate_gdp(population, currency_code.as_deref(), exchange_rate, rng);

    CountryRow {
        name,
        capital: non_blank(&country.capital),
        region: non_blank(&country.region),
        population,
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: non_blank(&country.flag_url),
        last_refreshed_at: refreshed_at,
    }
}

/// Validate and derive every source country. Countries that fail validation
/// are counted in `skipped`; a later duplicate of a normalized name replaces
/// the earlier one in place.
pub fn derive_batch<R: Rng + ?Sized>(
    countries: &[SourceCountry],
    rates: &RateTable,
    refreshed_at: DateTime<Utc>,
    rng: &mut R,
) -> DerivedBatch {
    let mut batch = DerivedBatch::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for country in countries {
        let issues = validate(country);
        if issues.iter().any(Issue::is_fatal) {
            tracing::warn!(?issues, name = ?country.name, "skipping invalid country");
            batch.skipped += 1;
            continue;
        }
        if !issues.is_empty() {
            tracing::debug!(?issues, name = ?country.name, "country admitted with gaps");
        }

        let name = country.name.as_deref().unwrap_or_default().trim().to_string();
        let row = derive_row(name, country, rates, refreshed_at, rng);

        match positions.get(&row.name_lower()) {
            Some(&idx) => batch.rows[idx] = row,
            None => {
                positions.insert(row.name_lower(), batch.rows.len());
                batch.rows.push(row);
            }
        }
    }

    batch
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
