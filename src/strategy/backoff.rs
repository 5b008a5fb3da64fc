use std::mem;

use tracing::debug;

use super::jitter::jitter;
use crate::duration::{ATTOSECONDS_PER_SECOND, Duration};

/// Each retry waits exponentially longer than the last, with every step jittered.
///
/// The strategy caches one step ahead: a call returns the value computed on the previous
/// call (or at construction) and stores `factor` times that value, jittered, for the
/// next call. With the defaults the first call yields roughly 100ms, the second roughly
/// 200ms, the third roughly 400ms, each scaled by a random multiplier in `[0.8, 1.0]`.
///
/// Once the arithmetic overflows, the strategy yields [`Duration::MAX`] forever.
///
/// A `factor` of `0` or `1` is accepted and gives a sequence that collapses to zero or
/// drifts downwards with jitter.
///
/// # Examples
///
/// ```
/// use persevere::Duration;
/// use persevere::strategy::BackoffStrategy;
///
/// let mut backoff = BackoffStrategy::new(2, Duration::from_millis(100));
/// let first = backoff.next_duration();
/// assert!(first >= Duration::from_millis(80) && first <= Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct BackoffStrategy {
    current: Duration,
    factor: u32,
    has_overflown: bool,
}

impl BackoffStrategy {
    /// Create a strategy that starts at `initial` and grows by `factor` on every step.
    ///
    /// # Panics
    ///
    /// Panics if `initial` is negative.
    pub fn new(factor: u32, initial: Duration) -> Self {
        assert!(
            !initial.is_negative(),
            "initial backoff duration must not be negative"
        );
        BackoffStrategy {
            current: jitter(initial),
            factor,
            has_overflown: false,
        }
    }

    /// Return the next backoff duration and advance the strategy.
    pub fn next_duration(&mut self) -> Duration {
        if self.has_overflown {
            return Duration::MAX;
        }

        match self.step() {
            Some(next) => mem::replace(&mut self.current, next),
            None => {
                self.has_overflown = true;
                debug!(factor = self.factor, "backoff overflowed, saturating");
                Duration::MAX
            }
        }
    }

    /// Whether the strategy has overflowed and is pinned to [`Duration::MAX`].
    pub fn has_overflown(&self) -> bool {
        self.has_overflown
    }

    fn step(&self) -> Option<Duration> {
        let factor = i64::from(self.factor);
        let (seconds, attoseconds) = self.current.components();

        let seconds = seconds.checked_mul(factor)?;
        let attoseconds = attoseconds.checked_mul(factor)?;
        let seconds = seconds.checked_add(attoseconds / ATTOSECONDS_PER_SECOND)?;

        Some(jitter(Duration::new(
            seconds,
            attoseconds % ATTOSECONDS_PER_SECOND,
        )))
    }
}

impl Default for BackoffStrategy {
    /// A factor of `2` starting at 100ms.
    fn default() -> Self {
        BackoffStrategy::new(2, Duration::from_millis(100))
    }
}

impl Iterator for BackoffStrategy {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_duration())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn assert_within(value: Duration, low: Duration, high: Duration) {
        assert!(
            value >= low && value <= high,
            "{value} not within [{low}, {high}]"
        );
    }

    #[test]
    fn grows_by_factor_with_jitter() {
        for _ in 0..100 {
            let mut backoff = BackoffStrategy::new(2, Duration::from_millis(100));
            assert_within(
                backoff.next_duration(),
                Duration::from_millis(80),
                Duration::from_millis(100),
            );
            assert_within(
                backoff.next_duration(),
                Duration::from_millis(128),
                Duration::from_millis(200),
            );
            assert_within(
                backoff.next_duration(),
                Duration::from_millis(204),
                Duration::from_millis(400),
            );
        }
    }

    #[test]
    fn default_matches_factor_two_from_100ms() {
        let first = BackoffStrategy::default().next_duration();
        assert_within(first, Duration::from_millis(80), Duration::from_millis(100));
    }

    #[test]
    fn strictly_increasing_with_factor_two() {
        let mut backoff = BackoffStrategy::new(2, Duration::from_millis(1));
        let mut previous = backoff.next_duration();
        for _ in 0..30 {
            let next = backoff.next_duration();
            assert!(next > previous, "{next} <= {previous}");
            previous = next;
        }
    }

    #[test]
    fn zero_initial_stays_zero() {
        let mut backoff = BackoffStrategy::new(2, Duration::ZERO);
        for _ in 0..50 {
            assert_eq!(backoff.next_duration(), Duration::ZERO);
        }
        assert!(!backoff.has_overflown());
    }

    #[test]
    fn factor_zero_collapses_after_first() {
        let mut backoff = BackoffStrategy::new(0, Duration::from_secs(1));
        assert_within(
            backoff.next_duration(),
            Duration::from_millis(800),
            Duration::from_secs(1),
        );
        assert_eq!(backoff.next_duration(), Duration::ZERO);
        assert_eq!(backoff.next_duration(), Duration::ZERO);
    }

    #[test]
    fn factor_one_does_not_grow() {
        let mut backoff = BackoffStrategy::new(1, Duration::from_secs(1));
        for _ in 0..10 {
            assert!(backoff.next_duration() <= Duration::from_secs(1));
        }
    }

    #[test]
    fn overflow_saturates_permanently() {
        let mut backoff = BackoffStrategy::new(2, Duration::from_secs(i64::MAX / 4));
        let saturated = (0..16).any(|_| backoff.next_duration() == Duration::MAX);
        assert!(saturated);
        assert!(backoff.has_overflown());
        for _ in 0..1_000 {
            assert_eq!(backoff.next_duration(), Duration::MAX);
        }
    }

    #[test]
    fn overflow_on_first_call_near_max() {
        let mut backoff = BackoffStrategy::new(2, Duration::from_secs(i64::MAX));
        assert_eq!(backoff.next_duration(), Duration::MAX);
        assert_eq!(backoff.next_duration(), Duration::MAX);
    }

    #[test]
    fn attosecond_overflow_saturates() {
        // 999ms jittered is at least 799ms, and 799ms worth of attoseconds times 20
        // exceeds i64::MAX even though the seconds component is zero.
        let mut backoff = BackoffStrategy::new(20, Duration::from_millis(999));
        assert_eq!(backoff.next_duration(), Duration::MAX);
        assert!(backoff.has_overflown());
    }

    #[test]
    fn carries_attoseconds_into_seconds() {
        let mut backoff = BackoffStrategy::new(4, Duration::from_millis(900));
        backoff.next_duration();
        // At least 0.8 * 4 * 720ms.
        assert!(backoff.next_duration() >= Duration::from_secs(2));
    }

    #[test]
    fn independent_instances_are_jittered_differently() {
        let initial = Duration::from_millis(100);
        let firsts: HashSet<Duration> = (0..10)
            .map(|_| BackoffStrategy::new(2, initial).next_duration())
            .inspect(|first| assert_within(*first, Duration::from_millis(80), initial))
            .collect();
        assert!(firsts.len() > 1);
    }

    #[test]
    fn iterates_forever() {
        let backoff = BackoffStrategy::new(2, Duration::from_millis(1));
        assert_eq!(backoff.take(5).count(), 5);
    }

    #[test]
    #[should_panic(expected = "must not be negative")]
    fn negative_initial_panics() {
        BackoffStrategy::new(2, Duration::from_millis(-1));
    }
}
