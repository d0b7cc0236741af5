//! Cache keys for each resource
//!
//! A key is `<kind>` followed by `:`-separated parameters. Parameters are
//! percent-escaped so an id containing `:` can never produce another
//! request's key. Currency codes are lower-cased first, since the API treats
//! `USD` and `usd` alike.

use crate::data::HistoryRange;

pub const GLOBAL_KEY: &str = "global";
pub const TRENDING_KEY: &str = "trending";

/// Key for one page of the market list
pub fn markets_key(currency: &str, page: u32, per_page: u32) -> String {
    format!(
        "markets:{}:{}:{}",
        encode_component(&currency.to_lowercase()),
        page,
        per_page
    )
}

/// Key for a single instrument's detail
pub fn coin_key(id: &str) -> String {
    format!("coin:{}", encode_component(id))
}

/// Key for a historical series
pub fn chart_key(id: &str, currency: &str, range: HistoryRange) -> String {
    format!(
        "chart:{}:{}:{}",
        encode_component(id),
        encode_component(&currency.to_lowercase()),
        range
    )
}

/// Percent-encodes everything outside the unreserved URL set
///
/// Also used for ids placed in URL paths and values in query strings.
pub fn encode_component(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}
