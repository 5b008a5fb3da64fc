//! Time sources the retry drivers suspend on.
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// A monotonic clock that can suspend until a deadline.
///
/// Cancellation is not the clock's concern: drivers race [`Clock::sleep_until`] against
/// their cancellation token and drop the sleep when the token fires.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;

    /// Resolve once `deadline` has passed.
    ///
    /// `tolerance` is how late the wake-up may be; `None` lets the clock choose.
    fn sleep_until(
        &self,
        deadline: Instant,
        tolerance: Option<Duration>,
    ) -> impl Future<Output = ()> + Send;
}

/// The tokio timer.
///
/// The timer wheel has a fixed one millisecond resolution, so `tolerance` cannot widen
/// the slack any further and is not used.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(
        &self,
        deadline: Instant,
        _tolerance: Option<Duration>,
    ) -> impl Future<Output = ()> + Send {
        tokio::time::sleep_until(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_sleeps_until_deadline() {
        let clock = TokioClock;
        let start = clock.now();
        let deadline = start + Duration::from_millis(250);

        clock
            .sleep_until(deadline, Some(Duration::from_millis(10)))
            .await;

        assert!(clock.now() >= deadline);
    }
}
