//! Provider traits for fetching historical bars.
//!
//! This module defines the upstream capability the retrieval services depend on:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`HistoryProvider`] - Daily OHLCV history for one symbol
//! - [`FetchOutcome`] - Tagged result of a single upstream call

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;

use crate::{
    error::{HistoryError, Result},
    types::{RawBar, Symbol},
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Outcome of one upstream history call.
///
/// A well-formed empty answer and a failed call are distinct tags; callers
/// treat both as retryable.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// At least one bar, in upstream (chronological) order.
    Bars(Vec<RawBar>),
    /// A well-formed answer with no bars.
    Empty,
    /// The call failed before producing an answer.
    Failed(HistoryError),
}

impl From<Result<Vec<RawBar>>> for FetchOutcome {
    fn from(result: Result<Vec<RawBar>>) -> Self {
        match result {
            Ok(bars) if bars.is_empty() => Self::Empty,
            Ok(bars) => Self::Bars(bars),
            Err(HistoryError::NoDataFound { .. }) => Self::Empty,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Provider for daily OHLCV history.
///
/// Implementations perform exactly one upstream call per invocation; retries
/// belong to the caller.
#[async_trait]
pub trait HistoryProvider: DataProvider {
    /// Fetches daily bars for `symbol` in `[start, end)`.
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchOutcome;
}
