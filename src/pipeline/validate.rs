use crate::sources::SourceCountry;

/// Something wrong with a source country. Only a missing name rejects the
/// record; the other issues have defined null/zero semantics downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issue {
    MissingName,
    InvalidPopulation,
    MissingCurrency,
}

impl Issue {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Issue::MissingName)
    }
}

pub fn validate(country: &SourceCountry) -> Vec<Issue> {
    let mut issues = Vec::new();

    if country.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        issues.push(Issue::MissingName);
    }
    if country.population().is_none() {
        issues.push(Issue::InvalidPopulation);
    }
    if country.currency_code().is_none() {
        issues.push(Issue::MissingCurrency);
    }

    issues
}
