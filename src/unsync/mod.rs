//! Asynchronous retry drivers with jittered exponential backoff and cooperative cancellation.
use std::future::Future;
use std::time::Duration as StdDuration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::clock::{Clock, TokioClock};
use crate::duration::Duration;
use crate::error::{Cancellation, Cancelled};
use crate::strategy::BackoffStrategy;

/// Backoff settings shared by the bounded and unbounded drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Multiplier applied to the delay after every failed attempt.
    pub backoff_factor: u32,
    /// Delay before the first retry, before jitter.
    pub backoff_duration: StdDuration,
    /// Scheduling slack handed to the clock for each suspension. `None` lets the clock
    /// decide. This is not a deadline for the retry sequence.
    pub tolerance: Option<StdDuration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            backoff_factor: 2,
            backoff_duration: StdDuration::from_millis(100),
            tolerance: None,
        }
    }
}

impl RetryConfig {
    pub fn with_backoff_factor(mut self, factor: u32) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_backoff_duration(mut self, duration: StdDuration) -> Self {
        self.backoff_duration = duration;
        self
    }

    pub fn with_tolerance(mut self, tolerance: StdDuration) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// A fresh backoff strategy for one retry sequence.
    pub fn strategy(&self) -> BackoffStrategy {
        BackoffStrategy::new(self.backoff_factor, Duration::from(self.backoff_duration))
    }
}

/// A [`RetryConfig`] bound to the [`Clock`] that backoff suspensions run on.
#[derive(Debug, Clone, Default)]
pub struct Retry<C = TokioClock> {
    config: RetryConfig,
    clock: C,
}

impl Retry<TokioClock> {
    pub fn new(config: RetryConfig) -> Self {
        Retry::with_clock(config, TokioClock)
    }
}

impl<C: Clock> Retry<C> {
    pub fn with_clock(config: RetryConfig, clock: C) -> Self {
        Retry { config, clock }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` up to `max_attempts` times.
    ///
    /// Between two attempts the driver suspends for the next backoff delay. The suspension
    /// ends early with [`Cancelled`] when `cancel` fires. An error for which
    /// [`Cancellation::is_cancellation`] holds is returned at once, without backoff. After
    /// the last attempt the error of that attempt is returned unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero.
    pub async fn attempts<OP, F, R, O, E>(
        &self,
        max_attempts: u32,
        cancel: &CancellationToken,
        operation: OP,
    ) -> Result<O, E>
    where
        OP: FnMut(CancellationToken) -> F,
        F: Future<Output = R>,
        R: Into<Result<O, E>>,
        E: Cancellation,
    {
        assert!(max_attempts > 0, "max_attempts must be at least 1");
        self.run(Some(u64::from(max_attempts)), cancel, operation)
            .await
    }

    /// Run `operation` until it succeeds or cancellation is observed.
    ///
    /// Ordinary failures are always retried, so unless the operation eventually succeeds
    /// this only returns once `cancel` fires or the operation reports cancellation.
    pub async fn indefinitely<OP, F, R, O, E>(
        &self,
        cancel: &CancellationToken,
        operation: OP,
    ) -> Result<O, E>
    where
        OP: FnMut(CancellationToken) -> F,
        F: Future<Output = R>,
        R: Into<Result<O, E>>,
        E: Cancellation,
    {
        self.run(None, cancel, operation).await
    }

    async fn run<OP, F, R, O, E>(
        &self,
        max_attempts: Option<u64>,
        cancel: &CancellationToken,
        mut operation: OP,
    ) -> Result<O, E>
    where
        OP: FnMut(CancellationToken) -> F,
        F: Future<Output = R>,
        R: Into<Result<O, E>>,
        E: Cancellation,
    {
        let mut backoff = self.config.strategy();
        let mut attempt: u64 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            match operation(cancel.clone()).await.into() {
                Ok(output) => {
                    if attempt > 1 {
                        debug!(attempts = attempt, "operation succeeded after retrying");
                    }
                    return Ok(output);
                }
                Err(err) if err.is_cancellation() => {
                    debug!(attempts = attempt, "operation reported cancellation");
                    return Err(err);
                }
                Err(err) if max_attempts.is_some_and(|max| attempt >= max) => {
                    debug!(attempts = attempt, "retry attempts exhausted");
                    return Err(err);
                }
                Err(_) => {}
            }

            let delay = backoff.next_duration();
            trace!(attempt, %delay, "attempt failed, backing off");
            self.suspend(delay, cancel).await?;
        }
    }

    async fn suspend(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), Cancelled> {
        // Delays past the clock's range only end through cancellation.
        let Some(deadline) = self.clock.now().checked_add(delay.to_std()) else {
            cancel.cancelled().await;
            debug!("cancelled during backoff");
            return Err(Cancelled);
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("cancelled during backoff");
                Err(Cancelled)
            }
            () = self.clock.sleep_until(deadline, self.config.tolerance) => Ok(()),
        }
    }
}

/// Execute an asynchronous operation up to `max_attempts` times with jittered exponential
/// backoff between attempts.
///
/// The operation receives a clone of `cancel` on every attempt. A failure that is the
/// [`Cancelled`] signal stops retrying immediately, and so does `cancel` firing while the
/// driver waits between attempts. Any other failure is retried until the attempts run
/// out, at which point the last error is returned.
///
/// # Panics
///
/// Panics if `max_attempts` is zero.
///
/// # Examples
///
/// ```
/// use std::io;
/// use persevere::unsync::{RetryConfig, retry};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let mut calls = 0;
///
/// let result = retry(3, RetryConfig::default(), &cancel, |_cancel| {
///     calls += 1;
///     let attempt = calls;
///     async move {
///         if attempt < 2 {
///             Err(io::Error::other("connection reset"))
///         } else {
///             Ok(attempt)
///         }
///     }
/// })
/// .await;
///
/// assert_eq!(result.unwrap(), 2);
/// # }
/// ```
pub async fn retry<OP, F, R, O, E>(
    max_attempts: u32,
    config: RetryConfig,
    cancel: &CancellationToken,
    operation: OP,
) -> Result<O, E>
where
    OP: FnMut(CancellationToken) -> F,
    F: Future<Output = R>,
    R: Into<Result<O, E>>,
    E: Cancellation,
{
    Retry::new(config)
        .attempts(max_attempts, cancel, operation)
        .await
}

/// Execute an asynchronous operation until it succeeds, with jittered exponential backoff
/// between attempts.
///
/// There is no attempt limit. Without an external party cancelling `cancel`, an operation
/// that never succeeds keeps this future pending forever.
///
/// # Examples
///
/// ```
/// use persevere::Cancelled;
/// use persevere::unsync::{RetryConfig, retry_indefinite};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let stopper = cancel.clone();
/// tokio::spawn(async move {
///     tokio::time::sleep(Duration::from_millis(50)).await;
///     stopper.cancel();
/// });
///
/// let config = RetryConfig::default().with_backoff_duration(Duration::from_millis(10));
/// let result: Result<(), Box<dyn std::error::Error + Send + Sync>> =
///     retry_indefinite(config, &cancel, |_cancel| async {
///         Err::<(), _>(Box::<dyn std::error::Error + Send + Sync>::from("still down"))
///     })
///     .await;
///
/// assert!(result.unwrap_err().is::<Cancelled>());
/// # }
/// ```
pub async fn retry_indefinite<OP, F, R, O, E>(
    config: RetryConfig,
    cancel: &CancellationToken,
    operation: OP,
) -> Result<O, E>
where
    OP: FnMut(CancellationToken) -> F,
    F: Future<Output = R>,
    R: Into<Result<O, E>>,
    E: Cancellation,
{
    Retry::new(config).indefinitely(cancel, operation).await
}
