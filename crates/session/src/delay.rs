//! Randomized, interruptible delays
//!
//! Production waits run up to an hour (the pause between token pairs). With
//! a cancellation token, the wait is slept in `SLICE` steps and the token is
//! checked before each step, so an interrupt takes effect within one slice.

use std::time::Duration;

use rand::RngExt;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Granularity at which a cancellable delay notices cancellation.
pub const SLICE: Duration = Duration::from_secs(5);

/// How a delay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    Completed,
    Cancelled,
}

/// Inclusive millisecond window a delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayWindow {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn is_valid(&self) -> bool {
        self.min_ms <= self.max_ms
    }

    pub async fn sleep(&self, cancel: Option<&CancellationToken>) -> DelayOutcome {
        delay(self.min_ms, self.max_ms, cancel).await
    }
}

/// Uniform random duration in `[min_ms, max_ms]`; reversed bounds are swapped.
pub fn pick_duration(min_ms: u64, max_ms: u64) -> Duration {
    let (lo, hi) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    if lo == hi {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rand::rng().random_range(lo..=hi))
}

/// Sleep a random duration in `[min_ms, max_ms]`.
///
/// Without `cancel` the full duration is slept. With it, returns
/// `Cancelled` at the first slice boundary after the token fires.
pub async fn delay(min_ms: u64, max_ms: u64, cancel: Option<&CancellationToken>) -> DelayOutcome {
    let total = pick_duration(min_ms, max_ms);
    sleep_for(total, cancel).await
}

/// Sleep exactly `total`, honoring `cancel` at slice boundaries.
pub async fn sleep_for(total: Duration, cancel: Option<&CancellationToken>) -> DelayOutcome {
    let Some(cancel) = cancel else {
        tokio::time::sleep(total).await;
        return DelayOutcome::Completed;
    };

    let mut remaining = total;
    loop {
        if cancel.is_cancelled() {
            return DelayOutcome::Cancelled;
        }
        if remaining.is_zero() {
            return DelayOutcome::Completed;
        }
        let step = remaining.min(SLICE);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
}

/// Short uncancellable pause added after rate-limit waits.
pub async fn jitter() {
    delay(500, 1500, None).await;
}
