//! Cache-aware client for the market data API
//!
//! Every resource goes through [`ApiClient::fetch_with_cache`], which serves
//! fresh cache entries without touching the network, writes successful
//! responses back, and falls back to stale entries when the API fails.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::ApiError;
use super::keys::{chart_key, coin_key, encode_component, markets_key, GLOBAL_KEY, TRENDING_KEY};
use super::transport::{ReqwestTransport, Transport};
use crate::cache::CacheManager;
use crate::data::{
    CoinDetail, GlobalData, GlobalResponse, HistoryRange, MarketChart, MarketCoin, TrendingCoin,
    TrendingResponse,
};

/// Base URL of the public API
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Parameters for one page of the market list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketsQuery {
    /// Quote currency code (e.g., "usd")
    pub currency: String,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
}

impl Default for MarketsQuery {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            page: 1,
            per_page: 100,
        }
    }
}

/// Client for fetching market data through the cache
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    cache: CacheManager,
    /// Base URL for the API, without trailing slash (allows override for testing)
    base_url: String,
}

impl ApiClient {
    /// Creates a client using `reqwest` and the public base URL
    pub fn new(cache: CacheManager) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()), cache)
    }

    /// Creates a client over a custom transport
    pub fn with_transport(transport: Arc<dyn Transport>, cache: CacheManager) -> Self {
        Self {
            transport,
            cache,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the client at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Fetches `url`, consulting and updating the cache under `cache_key`
    ///
    /// # Arguments
    /// * `url` - Full request URL
    /// * `cache_key` - Deterministic key for this request's result
    /// * `force_refresh` - Skip the fresh-cache check (user-triggered refresh)
    ///
    /// # Returns
    /// * `Ok(T)` - Fresh cache, fresh network data, or stale cache after a failure
    /// * `Err(ApiError)` - If the request fails and nothing was ever cached
    ///
    /// # Behavior
    /// - Unless `force_refresh`, returns a fresh cache entry without a network call
    /// - Otherwise fetches from the API and caches a success with the default TTL
    /// - On any failure (429, other statuses, network, unparseable body),
    ///   returns the cached entry however old it is, if there is one
    pub async fn fetch_with_cache<T>(
        &self,
        url: &str,
        cache_key: &str,
        force_refresh: bool,
    ) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        if !force_refresh {
            if let Some(data) = self.cache.get::<T>(cache_key) {
                return Ok(data);
            }
        }

        match self.fetch_from_api::<T>(url).await {
            Ok(data) => {
                self.cache.set(cache_key, &data);
                Ok(data)
            }
            Err(api_error) => {
                if let Some(stale) = self.cache.get_stale::<T>(cache_key) {
                    warn!(key = cache_key, error = %api_error, "serving stale cached data");
                    return Ok(stale);
                }
                Err(api_error)
            }
        }
    }

    /// Fetches and parses `url` without touching the cache
    async fn fetch_from_api<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!(url, "fetching from API");
        let response = self.transport.get(url).await?;

        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }

        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// One page of instruments ranked by market cap
    pub async fn markets(
        &self,
        query: &MarketsQuery,
        force_refresh: bool,
    ) -> Result<Vec<MarketCoin>, ApiError> {
        let key = markets_key(&query.currency, query.page, query.per_page);
        self.fetch_with_cache(&self.markets_url(query), &key, force_refresh)
            .await
    }

    /// Detail for one instrument, including market data, links and description
    pub async fn coin_detail(&self, id: &str, force_refresh: bool) -> Result<CoinDetail, ApiError> {
        self.fetch_with_cache(&self.coin_url(id), &coin_key(id), force_refresh)
            .await
    }

    /// Price, market cap and volume history for one instrument
    pub async fn market_chart(
        &self,
        id: &str,
        currency: &str,
        range: HistoryRange,
        force_refresh: bool,
    ) -> Result<MarketChart, ApiError> {
        let key = chart_key(id, currency, range);
        self.fetch_with_cache(&self.chart_url(id, currency, range), &key, force_refresh)
            .await
    }

    /// Aggregate statistics across the whole market
    pub async fn global_stats(&self, force_refresh: bool) -> Result<GlobalData, ApiError> {
        let url = format!("{}/global", self.base_url);
        let response: GlobalResponse = self
            .fetch_with_cache(&url, GLOBAL_KEY, force_refresh)
            .await?;
        Ok(response.data)
    }

    /// Currently trending instruments, in ranking order
    pub async fn trending(&self, force_refresh: bool) -> Result<Vec<TrendingCoin>, ApiError> {
        let url = format!("{}/search/trending", self.base_url);
        let response: TrendingResponse = self
            .fetch_with_cache(&url, TRENDING_KEY, force_refresh)
            .await?;
        Ok(response.into_coins())
    }

    fn markets_url(&self, query: &MarketsQuery) -> String {
        format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page={}&sparkline=true&price_change_percentage=1h,24h,7d",
            self.base_url,
            encode_component(&query.currency.to_lowercase()),
            query.per_page,
            query.page
        )
    }

    fn coin_url(&self, id: &str) -> String {
        format!(
            "{}/coins/{}?localization=false&tickers=false&community_data=false&developer_data=false",
            self.base_url,
            encode_component(id)
        )
    }

    fn chart_url(&self, id: &str, currency: &str, range: HistoryRange) -> String {
        format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url,
            encode_component(id),
            encode_component(&currency.to_lowercase()),
            range
        )
    }
}
