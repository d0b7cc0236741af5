//! tickercache library
//!
//! A persistent TTL cache ([`cache`]) and a cache-aware client for a
//! rate-limited market data API ([`api`]). The client serves fresh cache
//! entries without network calls and falls back to stale entries when the
//! API fails.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
