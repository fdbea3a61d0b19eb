use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Lookback window requested from a market data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[default]
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "max")]
    Max,
}

impl HistoryPeriod {
    pub const ALL: [Self; 6] = [
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
        Self::TenYears,
        Self::Max,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::Max => "max",
        }
    }

    /// Approximate number of trading sessions covered by the period.
    pub const fn trading_days(self) -> usize {
        match self {
            Self::SixMonths => 126,
            Self::OneYear => 252,
            Self::TwoYears => 504,
            Self::FiveYears => 1_260,
            Self::TenYears => 2_520,
            Self::Max => 5_040,
        }
    }
}

impl Display for HistoryPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            "10y" => Ok(Self::TenYears),
            "max" => Ok(Self::Max),
            other => Err(ValidationError::InvalidPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_period_is_two_years() {
        assert_eq!(HistoryPeriod::default(), HistoryPeriod::TwoYears);
        assert_eq!(HistoryPeriod::default().as_str(), "2y");
    }

    #[test]
    fn parses_period_case_insensitively() {
        let period = HistoryPeriod::from_str(" 5Y ").expect("must parse");
        assert_eq!(period, HistoryPeriod::FiveYears);
    }

    #[test]
    fn rejects_unknown_period() {
        let err = HistoryPeriod::from_str("3w").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidPeriod { .. }));
    }
}
