//! Timers used by the panel loop. All are driven by `tokio::time`, so tests
//! can run them on paused virtual time.

use std::{future, pin::Pin, time::Duration};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep, interval, sleep};

/// Single-shot timer that is pushed back on every `schedule`. Only the value
/// from the last `schedule` before a quiet period of `delay` is delivered.
#[derive(Debug)]
pub struct Debounce<T> {
    delay: Duration,
    sleep: Pin<Box<Sleep>>,
    pending: Option<T>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            sleep: Box::pin(sleep(Duration::ZERO)),
            pending: None,
        }
    }

    /// Replace any pending value and restart the quiet period.
    pub fn schedule(&mut self, value: T) {
        self.pending = Some(value);
        self.sleep.as_mut().reset(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolves with the pending value once the quiet period has elapsed.
    /// Never resolves while nothing is scheduled. Cancel safe.
    pub async fn fired(&mut self) -> T {
        loop {
            if self.pending.is_none() {
                future::pending::<()>().await;
            }
            self.sleep.as_mut().await;
            if let Some(value) = self.pending.take() {
                return value;
            }
        }
    }
}

/// Fixed-period poller whose first tick is immediate. Late ticks are delayed
/// rather than bunched up.
pub fn poller(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
