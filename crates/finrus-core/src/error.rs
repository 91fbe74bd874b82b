//! Error types for history retrieval.
//!
//! This module defines [`HistoryError`] which covers every failure that can
//! occur while validating a request, talking to an upstream provider, or
//! normalizing what it returned.
//!
//! Only [`HistoryError::InvalidInput`] is surfaced to callers of the
//! retrieval services. Every other variant is folded into an error-shaped
//! [`FetchResult`](crate::FetchResult).

use thiserror::Error;

/// Errors that can occur during history retrieval.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// Malformed ticker or date supplied by the caller.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider answered, but with no rows for the requested range.
    #[error("No data found for {symbol} in range {start} to {end}")]
    NoDataFound {
        /// The symbol that was requested.
        symbol: String,
        /// Start of the requested date range.
        start: String,
        /// End of the requested date range.
        end: String,
    },

    /// Error parsing a provider response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A fetched row could not be normalized.
    #[error("Processing error: {0}")]
    Processing(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl HistoryError {
    /// Returns true if this error should be reported to the caller rather
    /// than folded into an error-shaped result.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type alias using [`HistoryError`].
pub type Result<T> = std::result::Result<T, HistoryError>;
