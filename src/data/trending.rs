//! Trending-ranked instruments from `/search/trending`

use serde::{Deserialize, Serialize};

/// Raw `/search/trending` body
///
/// Only the coin list is kept; the NFT and category sections are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendingResponse {
    #[serde(default)]
    pub coins: Vec<TrendingEntry>,
}

impl TrendingResponse {
    /// The coins in ranking order
    pub fn into_coins(self) -> Vec<TrendingCoin> {
        self.coins.into_iter().map(|entry| entry.item).collect()
    }
}

/// Each ranked coin is wrapped in an `item` object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub item: TrendingCoin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub id: String,
    #[serde(default)]
    pub coin_id: Option<u64>,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub price_btc: Option<f64>,
    /// Zero-based trending position
    #[serde(default)]
    pub score: Option<u32>,
}
