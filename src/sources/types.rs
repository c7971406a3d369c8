use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// One entry of the country metadata payload. Every field is optional since
/// the upstream omits or nulls them freely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceCountry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Kept raw so a non-numeric population degrades to null instead of
    /// failing the whole payload
    #[serde(default)]
    pub population: Option<Value>,
    #[serde(default, rename = "flag")]
    pub flag_url: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<SourceCurrency>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceCurrency {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl SourceCountry {
    /// Code of the first listed currency, if it has one
    pub fn currency_code(&self) -> Option<&str> {
        self.currencies
            .as_deref()?
            .first()?
            .code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// Population as a non-negative integer. Strings, negatives and
    /// fractional numbers count as missing.
    pub fn population(&self) -> Option<i64> {
        match self.population.as_ref()? {
            Value::Number(n) => n.as_i64().filter(|p| *p >= 0).or_else(|| {
                n.as_f64()
                    .filter(|p| p.is_finite() && *p >= 0.0 && p.fract() == 0.0 && *p < i64::MAX as f64)
                    .map(|p| p as i64)
            }),
            _ => None,
        }
    }
}

/// Currency code to rate against the base currency of the rate source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Read the `rates` object out of a rate payload. Returns `None` when the
    /// mapping is missing or is not an object. Entries that are not positive
    /// finite numbers are dropped.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let rates = payload.get("rates")?.as_object()?;

        let rates = rates
            .iter()
            .filter_map(|(code, value)| {
                value
                    .as_f64()
                    .filter(|rate| rate.is_finite() && *rate > 0.0)
                    .map(|rate| (code.clone(), rate))
            })
            .collect();

        Some(Self { rates })
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|(code, rate)| (code.into(), rate)).collect(),
        }
    }
}
