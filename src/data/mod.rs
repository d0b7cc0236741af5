//! Response models for the market data API
//!
//! These types mirror the JSON bodies of the upstream endpoints. They are
//! both `Deserialize` (parsed from the network) and `Serialize` (written to
//! the cache and printed by the CLI). Optional or frequently-null fields are
//! `Option`s with `#[serde(default)]` so a sparse response still parses.

pub mod chart;
pub mod coin;
pub mod global;
pub mod trending;

pub use chart::{HistoryRange, MarketChart, SeriesPoint};
pub use coin::{CoinDetail, CoinLinks, CoinMarketData, CurrencyMap, MarketCoin, Sparkline};
pub use global::{GlobalData, GlobalResponse};
pub use trending::{TrendingCoin, TrendingResponse};
