#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finrus/finrus/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cache store implementations for fetched historical data.
//!
//! This crate provides implementations of the [`ResultCache`] trait from `finrus-core`:
//!
//! - [`InMemoryCache`] - Process-lifetime TTL cache (the default store)
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use finrus_core::ResultCache;

// Re-export implementations
pub use memory::InMemoryCache;
pub use noop::NoopCache;
