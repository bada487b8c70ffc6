use std::future::Future;
use std::time::{Duration, Instant};

/// Accumulates the wall-clock time of the operations under measurement.
///
/// Every window is taken from the same monotonic clock ([`Instant`]) and added
/// to a single running total.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stopwatch {
    total: Duration,
    windows: u64,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start() -> Instant {
        Instant::now()
    }

    /// Close a window opened with [`Stopwatch::start`] and add it to the total.
    pub fn elapsed(&mut self, started: Instant) -> Duration {
        let elapsed = started.elapsed();
        self.total += elapsed;
        self.windows += 1;
        elapsed
    }

    /// Time a single awaited operation. The window is recorded whether the
    /// operation succeeds or fails.
    pub async fn measure<F, T>(&mut self, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        let started = Self::start();
        let output = operation.await;
        self.elapsed(started);
        output
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Number of windows recorded so far.
    pub fn windows(&self) -> u64 {
        self.windows
    }
}

/// ISO-8601 duration text such as `PT1M30.25S`. Zero prints as `PT0S`.
pub fn iso8601(duration: Duration) -> String {
    let secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    if secs == 0 && nanos == 0 {
        return "PT0S".to_string();
    }

    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    let mut text = String::from("PT");
    if hours > 0 {
        text.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        text.push_str(&format!("{minutes}M"));
    }
    if seconds > 0 || nanos > 0 {
        text.push_str(&seconds.to_string());
        if nanos > 0 {
            let fraction = format!("{nanos:09}");
            text.push('.');
            text.push_str(fraction.trim_end_matches('0'));
        }
        text.push('S');
    }
    text
}
