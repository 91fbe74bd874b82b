//! Bounded, constant-delay retries around a single upstream call.

use std::time::Duration;

use finrus_core::{DataProvider, DateRange, FetchOutcome, HistoryProvider, RawBar, Symbol};
use tracing::{error, info, warn};

use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

/// How often and how patiently to call the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Sleep between consecutive attempts. Never grows.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy. A zero attempt budget still makes one attempt.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Calls the provider until it returns bars or the attempt budget runs out.
///
/// Empty answers and failures are both retried after `policy.delay`; no
/// delay follows the final attempt. A
/// [`HistoryError::InvalidInput`](finrus_core::HistoryError::InvalidInput)
/// failure ends the loop at once. Returns `None` when no attempt produced
/// bars. There is no cancellation: a caller that stops waiting simply drops
/// the future.
pub async fn fetch_with_retry(
    provider: &dyn HistoryProvider,
    symbol: &Symbol,
    range: DateRange,
    policy: &RetryPolicy,
) -> Option<Vec<RawBar>> {
    let max_attempts = policy.max_attempts;

    for attempt in 1..=max_attempts {
        match provider.fetch_history(symbol, range.start, range.end).await {
            FetchOutcome::Bars(bars) => {
                if attempt > 1 {
                    info!(symbol = %symbol, attempt, "Fetch succeeded after retry");
                }
                return Some(bars);
            }
            FetchOutcome::Empty => {
                warn!(
                    symbol = %symbol,
                    provider = provider.name(),
                    attempt,
                    max_attempts,
                    "No data found for {range}"
                );
            }
            FetchOutcome::Failed(e) if e.is_invalid_input() => {
                error!(
                    symbol = %symbol,
                    provider = provider.name(),
                    attempt,
                    error = %e,
                    "Provider rejected the request, not retrying"
                );
                return None;
            }
            FetchOutcome::Failed(e) => {
                warn!(
                    symbol = %symbol,
                    provider = provider.name(),
                    attempt,
                    max_attempts,
                    error = %e,
                    "Error fetching data"
                );
            }
        }

        if attempt < max_attempts {
            info!(symbol = %symbol, "Retrying in {:?}", policy.delay);
            tokio::time::sleep(policy.delay).await;
        }
    }

    error!(symbol = %symbol, max_attempts, "All retry attempts failed");
    None
}
