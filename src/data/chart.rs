//! Historical series from `/coins/{id}/market_chart`

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `[timestamp_ms, value]` pair as the API sends it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint(pub i64, pub f64);

/// Price, market cap and volume series over a time range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<SeriesPoint>,
    #[serde(default)]
    pub market_caps: Vec<SeriesPoint>,
    #[serde(default)]
    pub total_volumes: Vec<SeriesPoint>,
}

/// How far back a historical series reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryRange {
    Days(u32),
    /// Everything the API has
    Max,
}

impl Default for HistoryRange {
    fn default() -> Self {
        HistoryRange::Days(7)
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryRange::Days(days) => write!(f, "{}", days),
            HistoryRange::Max => f.write_str("max"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_parallel_pairs() {
        let json = r#"{
            "prices": [[1700000000000, 100.0], [1700003600000, 110.0]],
            "market_caps": [[1700000000000, 5000000.0]],
            "total_volumes": []
        }"#;

        let chart: MarketChart = serde_json::from_str(json).unwrap();
        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.prices[1], SeriesPoint(1_700_003_600_000, 110.0));
        assert_eq!(chart.market_caps[0].1, 5_000_000.0);
        assert!(chart.total_volumes.is_empty());
    }

    #[test]
    fn test_history_range_display() {
        assert_eq!(HistoryRange::Days(30).to_string(), "30");
        assert_eq!(HistoryRange::Max.to_string(), "max");
        assert_eq!(HistoryRange::default(), HistoryRange::Days(7));
    }
}
