use std::str::FromStr;

use crate::error::Error;

/// Ordering for the list query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Insertion order
    #[default]
    Natural,
    GdpDesc,
    GdpAsc,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub const ACCEPTED: &'static [&'static str] = &["gdp_desc", "gdp_asc", "name_asc", "name_desc"];

    pub fn order_by(&self) -> &'static str {
        match self {
            SortOrder::Natural => "ORDER BY id",
            // NULL estimates always sink to the end
            SortOrder::GdpDesc => "ORDER BY estimated_gdp IS NULL, estimated_gdp DESC, id",
            SortOrder::GdpAsc => "ORDER BY estimated_gdp IS NULL, estimated_gdp ASC, id",
            SortOrder::NameAsc => "ORDER BY name_lower ASC",
            SortOrder::NameDesc => "ORDER BY name_lower DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(SortOrder::Natural),
            "gdp_desc" => Ok(SortOrder::GdpDesc),
            "gdp_asc" => Ok(SortOrder::GdpAsc),
            "name_asc" => Ok(SortOrder::NameAsc),
            "name_desc" => Ok(SortOrder::NameDesc),
            other => Err(Error::Validation {
                field: "sort",
                message: format!(
                    "unsupported value '{}', expected one of {}",
                    other,
                    Self::ACCEPTED.join(", ")
                ),
            }),
        }
    }
}

/// Filters for the list query. Absent filters impose no constraint; present
/// ones are ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: SortOrder,
}

impl CountryFilter {
    /// Build a filter from raw query values, treating blank strings as absent
    pub fn parse(
        region: Option<&str>,
        currency: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self, Error> {
        Ok(Self {
            region: present(region),
            currency: present(currency),
            sort: sort.map(str::parse::<SortOrder>).transpose()?.unwrap_or_default(),
        })
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        assert_eq!("gdp_desc".parse::<SortOrder>().unwrap(), SortOrder::GdpDesc);
        assert_eq!("GDP_ASC".parse::<SortOrder>().unwrap(), SortOrder::GdpAsc);
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::Natural);
        assert!(matches!(
            "population".parse::<SortOrder>(),
            Err(Error::Validation { field: "sort", .. })
        ));
    }

    #[test]
    fn test_filter_ignores_blank_values() {
        let filter = CountryFilter::parse(Some(" "), Some("NGN"), None).unwrap();
        assert_eq!(filter.region, None);
        assert_eq!(filter.currency.as_deref(), Some("NGN"));
        assert_eq!(filter.sort, SortOrder::Natural);
    }
}
