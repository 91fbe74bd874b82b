//! Shared stub provider for service tests.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use finrus::{DataProvider, FetchOutcome, HistoryError, HistoryProvider, RawBar, Symbol};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// A provider that replays per-ticker scripts.
///
/// Each ticker's script is consumed front to back and its last outcome
/// repeats forever. Tickers without a script answer `Empty`.
#[derive(Debug, Default)]
pub struct StubProvider {
    scripts: Mutex<HashMap<String, Vec<FetchOutcome>>>,
    requests: Mutex<Vec<(Symbol, NaiveDate, NaiveDate)>>,
    calls: AtomicU32,
    latency: Duration,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, ticker: &str, mut script: Vec<FetchOutcome>) -> Self {
        script.reverse();
        self.scripts
            .lock()
            .unwrap()
            .insert(ticker.to_string(), script);
        self
    }

    /// Delays every answer, so concurrent callers overlap upstream.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(Symbol, NaiveDate, NaiveDate)> {
        self.requests.lock().unwrap().clone()
    }
}

impl DataProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn description(&self) -> &str {
        "scripted test provider"
    }
}

#[async_trait]
impl HistoryProvider for StubProvider {
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((symbol.clone(), start, end));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(symbol.as_str()) {
            Some(script) if script.len() > 1 => script.pop().unwrap(),
            Some(script) => script[0].clone(),
            None => FetchOutcome::Empty,
        }
    }
}

/// Two January 2024 NYSE sessions, as the upstream reports them.
pub fn january_bars() -> Vec<RawBar> {
    let est = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
    vec![
        RawBar::new(
            est.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
            187.15,
            188.44,
            183.885,
            185.64,
            82_488_700.0,
        )
        .with_adjusted_close(184.938_79),
        RawBar::new(
            est.with_ymd_and_hms(2024, 1, 3, 9, 30, 0).unwrap(),
            184.22,
            185.88,
            183.43,
            184.25,
            58_414_500.0,
        )
        .with_adjusted_close(183.553_98),
    ]
}

/// A bar whose volume cannot be a share count.
pub fn fractional_volume_bar() -> RawBar {
    RawBar::new(
        Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap().fixed_offset(),
        1.0,
        1.0,
        1.0,
        1.0,
        10.5,
    )
}

pub fn network_error() -> FetchOutcome {
    FetchOutcome::Failed(HistoryError::Network("connection reset by peer".to_string()))
}
