//! Aggregate market statistics from `/global`

use serde::{Deserialize, Serialize};

use super::coin::CurrencyMap;

/// Envelope the `/global` endpoint wraps its payload in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalResponse {
    pub data: GlobalData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalData {
    #[serde(default)]
    pub active_cryptocurrencies: u64,
    #[serde(default)]
    pub markets: u64,
    #[serde(default)]
    pub total_market_cap: CurrencyMap,
    #[serde(default)]
    pub total_volume: CurrencyMap,
    /// Dominance per coin symbol, in percent
    #[serde(default)]
    pub market_cap_percentage: CurrencyMap,
    #[serde(default)]
    pub market_cap_change_percentage_24h_usd: Option<f64>,
    /// Epoch seconds
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_envelope() {
        let json = r#"{
            "data": {
                "active_cryptocurrencies": 14000,
                "markets": 1100,
                "total_market_cap": { "usd": 2400000000000.0 },
                "market_cap_percentage": { "btc": 52.1, "eth": 16.9 },
                "market_cap_change_percentage_24h_usd": 0.8,
                "updated_at": 1700000000
            }
        }"#;

        let global: GlobalResponse = serde_json::from_str(json).unwrap();
        assert_eq!(global.data.active_cryptocurrencies, 14000);
        assert_eq!(global.data.total_market_cap.get("usd"), Some(&2.4e12));
        assert_eq!(global.data.market_cap_percentage.get("btc"), Some(&52.1));
        assert_eq!(global.data.updated_at, Some(1_700_000_000));
    }

    #[test]
    fn test_missing_fields_default() {
        let global: GlobalResponse = serde_json::from_str(r#"{ "data": {} }"#).unwrap();
        assert_eq!(global.data, GlobalData::default());
    }
}
