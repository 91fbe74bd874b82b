//! Conversion of provider bars into canonical rows.
//!
//! Normalization is deliberately lossy: the bar's offset is dropped and only
//! its local calendar date is kept, prices are rounded to cents with
//! round-half-to-even, and volume becomes a whole number. Row order is
//! preserved exactly as received.

use crate::{
    error::{HistoryError, Result},
    types::{RawBar, Row},
};

/// Rounds to two decimal places, breaking ties to the even cent.
///
/// The value is scaled by 100 first, so `123.455` (which scales to exactly
/// `12345.5`) rounds to `123.46` and `0.125` rounds to `0.12`.
#[must_use]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Normalizes a sequence of bars.
///
/// # Errors
/// Returns [`HistoryError::Processing`] if any price is non-finite or any
/// volume is not a non-negative whole number.
pub fn normalize(bars: &[RawBar]) -> Result<Vec<Row>> {
    bars.iter().map(normalize_bar).collect()
}

/// Normalizes a single bar.
///
/// # Errors
/// See [`normalize`].
pub fn normalize_bar(bar: &RawBar) -> Result<Row> {
    let date = bar.timestamp.naive_local().date();

    Ok(Row {
        date,
        open: price(bar.open, "Open", bar)?,
        high: price(bar.high, "High", bar)?,
        low: price(bar.low, "Low", bar)?,
        close: price(bar.close, "Close", bar)?,
        adj_close: bar
            .adjusted_close
            .map(|value| price(value, "Adj Close", bar))
            .transpose()?,
        volume: volume(bar)?,
    })
}

fn price(value: f64, column: &str, bar: &RawBar) -> Result<f64> {
    if !value.is_finite() {
        return Err(HistoryError::Processing(format!(
            "non-finite {column} value {value} at {}",
            bar.timestamp
        )));
    }
    Ok(round_cents(value))
}

fn volume(bar: &RawBar) -> Result<u64> {
    let value = bar.volume;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= u64::MAX as f64 {
        return Err(HistoryError::Processing(format!(
            "volume {value} at {} is not a whole number of units",
            bar.timestamp
        )));
    }
    Ok(value as u64)
}
