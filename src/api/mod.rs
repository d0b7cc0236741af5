//! Cache-aware client for the market data API
//!
//! Fresh cache, then network, then stale cache: a request only fails when
//! the network fails and nothing was ever cached for it.

mod client;
mod error;
pub mod keys;
mod transport;

pub use client::{ApiClient, MarketsQuery, DEFAULT_BASE_URL};
pub use error::{ApiError, TOO_MANY_REQUESTS};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};
