#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finrus/finrus/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cached, retrying retrieval of daily price history.
//!
//! This crate ties a [`HistoryProvider`] and a [`ResultCache`] together into a
//! [`HistoryService`]. It re-exports the core types, the cache stores and the
//! default provider.
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance provider (enabled by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use finrus::{HistoryService, RetrievalConfig};
//!
//! #[tokio::main]
//! async fn main() -> finrus::Result<()> {
//!     let service = HistoryService::yahoo(RetrievalConfig::default());
//!
//!     let batch = service
//!         .retrieve_many(&["AAPL", "MSFT"], "2024-01-01", "2024-02-01", true)
//!         .await?;
//!     for (symbol, result) in &batch {
//!         println!("{symbol}: {} rows", result.metadata.data_points);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use finrus_core::*;

// Cache implementations
pub use finrus_cache::{InMemoryCache, NoopCache};

// Providers
#[cfg(feature = "yahoo")]
pub use finrus_yahoo::YahooProvider;

mod config;
pub use config::{
    DEFAULT_FALLBACK_WINDOW_DAYS, DEFAULT_MAX_ATTEMPTS, DEFAULT_PACING_DELAY, DEFAULT_RETRY_DELAY,
    MAX_RECENT_DAYS, RetrievalConfig,
};

mod retry;
pub use retry::{RetryPolicy, fetch_with_retry};

mod service;
pub use service::{HistoryService, NO_DATA_FOUND};
