#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finrus/finrus/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for historical data retrieval.
//!
//! This crate provides the foundational abstractions shared by the cache,
//! provider and service crates:
//!
//! - [`HistoryProvider`](provider::HistoryProvider) - Upstream OHLCV history
//! - [`ResultCache`](cache::ResultCache) - Caching abstraction
//! - [`normalize`](normalize::normalize) - Raw bars to canonical rows

/// Cache trait and key derivation.
pub mod cache;
/// Error types for retrieval operations.
pub mod error;
/// Raw bar normalization.
pub mod normalize;
/// Provider traits for fetching history.
pub mod provider;
/// Core data types (Symbol, Row, FetchResult, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::{CacheKey, DEFAULT_CACHE_TTL, ResultCache};
pub use error::{HistoryError, Result};
pub use normalize::{normalize, round_cents};
pub use provider::{DataProvider, FetchOutcome, HistoryProvider};
pub use types::{
    CacheInfo, DATE_FORMAT, DateRange, FETCHED_AT_FORMAT, FetchMetadata, FetchResult,
    HistoryRequest, RawBar, Row, Symbol, parse_date,
};
