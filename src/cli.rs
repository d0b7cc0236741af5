//! Command-line interface parsing for tickercache
//!
//! This module handles parsing of CLI arguments using clap: one subcommand per
//! API resource, cache maintenance commands, and the global `--refresh` flag
//! that forces a network fetch.

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::HistoryRange;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The `--days` value is neither a positive integer nor "max"
    #[error("Invalid days: '{0}'. Use a positive number of days or 'max'")]
    InvalidDays(String),
}

/// tickercache - cached market data from the command line
#[derive(Parser, Debug)]
#[command(name = "tickercache")]
#[command(about = "Market data with a persistent, stale-tolerant cache")]
#[command(version)]
pub struct Cli {
    /// Skip fresh cache entries and fetch from the API
    ///
    /// Cached data is still used if the fetch fails.
    #[arg(long, global = true)]
    pub refresh: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List instruments ranked by market cap
    Markets {
        #[arg(long, default_value = "usd")]
        currency: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 100)]
        per_page: u32,
    },
    /// Show detail for one instrument
    Coin {
        /// Instrument id (e.g., "bitcoin")
        id: String,
    },
    /// Show price history for one instrument
    Chart {
        id: String,
        #[arg(long, default_value = "usd")]
        currency: String,
        /// Number of days, or "max"
        #[arg(long, default_value = "7", value_parser = parse_days_arg)]
        days: HistoryRange,
    },
    /// Show aggregate market statistics
    Global,
    /// Show trending instruments
    Trending,
    /// Fetch global stats, trending and the first markets page together
    Overview,
    /// Inspect or maintain the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
    /// Print entry counts and size
    Stats,
    /// Remove every cached entry
    Clear,
    /// Remove expired entries
    Sweep,
    /// Remove one entry by cache key (e.g., "coin:bitcoin")
    Invalidate { key: String },
}

/// Parses a `--days` argument into a HistoryRange.
///
/// # Arguments
/// * `s` - "max" (any case) or a positive integer
///
/// # Returns
/// * `Ok(HistoryRange)` if the string is valid
/// * `Err(CliError::InvalidDays)` otherwise
pub fn parse_days_arg(s: &str) -> Result<HistoryRange, CliError> {
    if s.eq_ignore_ascii_case("max") {
        return Ok(HistoryRange::Max);
    }
    match s.parse::<u32>() {
        Ok(days) if days > 0 => Ok(HistoryRange::Days(days)),
        _ => Err(CliError::InvalidDays(s.to_string())),
    }
}
