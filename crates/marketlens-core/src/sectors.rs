use serde::{Deserialize, Serialize};

use crate::DEFAULT_SECTOR;

/// Fifty large-cap US equities collected when no ticker list is configured.
pub const STANDARD_TICKERS: [&str; 50] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "BRK-B", "UNH", "JNJ", "V", "WMT",
    "XOM", "LLY", "JPM", "PG", "MA", "HD", "CVX", "MRK", "ABBV", "PEP", "KO", "AVGO", "PFE",
    "TMO", "COST", "BAC", "NFLX", "CRM", "ACN", "LIN", "MCD", "ABT", "ADBE", "DHR", "VZ", "WFC",
    "NEE", "CMCSA", "PM", "NKE", "TXN", "RTX", "UNP", "LOW", "AMD", "T", "QCOM", "HON",
];

/// One named sector and its member tickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorGroup {
    pub name: String,
    pub tickers: Vec<String>,
}

impl SectorGroup {
    pub fn new<S: Into<String>>(name: impl Into<String>, tickers: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            tickers: tickers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered static sector classification.
///
/// Lookup is first-match in declaration order and case-sensitive; tickers
/// found in no group fall back to [`DEFAULT_SECTOR`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorMap {
    groups: Vec<SectorGroup>,
}

impl SectorMap {
    pub fn new(groups: Vec<SectorGroup>) -> Self {
        Self { groups }
    }

    pub fn classify(&self, ticker: &str) -> &str {
        self.groups
            .iter()
            .find(|group| group.tickers.iter().any(|member| member == ticker))
            .map_or(DEFAULT_SECTOR, |group| group.name.as_str())
    }

    pub fn groups(&self) -> &[SectorGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Classification of the [`STANDARD_TICKERS`] universe.
    pub fn standard() -> Self {
        Self::new(vec![
            SectorGroup::new(
                "Technology",
                ["AAPL", "MSFT", "GOOGL", "META", "NVDA", "CRM", "ADBE", "AMD", "TXN", "QCOM"],
            ),
            SectorGroup::new(
                "Healthcare",
                ["UNH", "JNJ", "LLY", "PFE", "TMO", "MRK", "ABBV", "ABT", "DHR"],
            ),
            SectorGroup::new("Financial", ["BRK-B", "V", "JPM", "MA", "BAC", "WFC"]),
            SectorGroup::new(
                "Consumer",
                ["AMZN", "TSLA", "WMT", "PG", "HD", "COST", "MCD", "NKE", "LOW"],
            ),
            SectorGroup::new("Energy", ["XOM", "CVX"]),
            SectorGroup::new("Communication", ["NFLX", "VZ", "CMCSA", "T"]),
            SectorGroup::new("Industrial", ["RTX", "UNP", "HON"]),
            SectorGroup::new("Materials", ["LIN"]),
            SectorGroup::new("Utilities", ["NEE"]),
            SectorGroup::new("Consumer Staples", ["PEP", "KO", "PM"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_group_wins() {
        let map = SectorMap::new(vec![
            SectorGroup::new("Alpha", ["AAA", "BBB"]),
            SectorGroup::new("Beta", ["BBB"]),
        ]);
        assert_eq!(map.classify("BBB"), "Alpha");
    }

    #[test]
    fn lookup_is_case_sensitive_with_default() {
        let map = SectorMap::standard();
        assert_eq!(map.classify("AAPL"), "Technology");
        assert_eq!(map.classify("aapl"), DEFAULT_SECTOR);
        assert_eq!(map.classify("ZZZZ"), DEFAULT_SECTOR);
    }

    #[test]
    fn standard_map_leaves_unmapped_tickers_as_other() {
        let map = SectorMap::standard();
        assert_eq!(map.classify("PG"), "Consumer");
        assert_eq!(map.classify("AVGO"), DEFAULT_SECTOR);
        assert_eq!(map.classify("ACN"), DEFAULT_SECTOR);
    }

    #[test]
    fn deserializes_from_ordered_list() {
        let map: SectorMap = serde_json::from_str(
            r#"[{"name":"Energy","tickers":["XOM"]},{"name":"Tech","tickers":["XOM","AAPL"]}]"#,
        )
        .expect("valid map");
        assert_eq!(map.classify("XOM"), "Energy");
        assert_eq!(map.classify("AAPL"), "Tech");
    }
}
