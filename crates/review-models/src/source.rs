use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a review was obtained from. `external_id` values are only
/// meaningful within one source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSource {
    /// Google Places API
    Google,
    /// TripAdvisor Content API
    Tripadvisor,
    /// Manual CSV batch import
    CsvImport,
    /// Hard-coded placeholder data (all live sources down)
    Fallback,
}

impl ReviewSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewSource::Google => "google",
            ReviewSource::Tripadvisor => "tripadvisor",
            ReviewSource::CsvImport => "csv_import",
            ReviewSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ReviewSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(ReviewSource::Google),
            "tripadvisor" => Ok(ReviewSource::Tripadvisor),
            "csv_import" | "csv" => Ok(ReviewSource::CsvImport),
            "fallback" => Ok(ReviewSource::Fallback),
            other => Err(format!("Unknown review source: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_str() {
        for source in [
            ReviewSource::Google,
            ReviewSource::Tripadvisor,
            ReviewSource::CsvImport,
            ReviewSource::Fallback,
        ] {
            assert_eq!(source.as_str().parse::<ReviewSource>().unwrap(), source);
        }
    }

    #[test]
    fn test_csv_alias() {
        assert_eq!("csv".parse::<ReviewSource>().unwrap(), ReviewSource::CsvImport);
    }
}
