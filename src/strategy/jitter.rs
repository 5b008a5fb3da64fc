use rand::Rng;

use crate::duration::{ATTOSECONDS_PER_SECOND, Duration};

/// Smallest multiplier jitter will scale a duration by.
pub const JITTER_MIN: f64 = 0.8;
/// Largest multiplier jitter will scale a duration by.
pub const JITTER_MAX: f64 = 1.0;

/// Scale `duration` by a multiplier drawn uniformly from `[JITTER_MIN, JITTER_MAX]`.
///
/// Every call draws a fresh multiplier from the thread-local generator.
pub fn jitter(duration: Duration) -> Duration {
    let multiplier = rand::rng().random_range(JITTER_MIN..=JITTER_MAX);
    scale(duration, multiplier)
}

/// Multiply both components by `multiplier` and truncate, moving the fractional part of
/// the scaled seconds into the attosecond component.
pub(crate) fn scale(duration: Duration, multiplier: f64) -> Duration {
    if duration == Duration::MAX {
        return Duration::MAX;
    }

    let (seconds, attoseconds) = duration.components();

    let scaled_seconds = seconds as f64 * multiplier;
    let whole_seconds = scaled_seconds.trunc();
    let carry = ((scaled_seconds - whole_seconds) * ATTOSECONDS_PER_SECOND as f64) as i64;
    // Both terms stay below one second, so the sum cannot overflow.
    let attoseconds = (attoseconds as f64 * multiplier) as i64 + carry;

    Duration::checked_new(whole_seconds as i64, attoseconds).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_carries_fractional_seconds() {
        let scaled = scale(Duration::from_secs(5), 0.9);
        assert_eq!(scaled.components(), (4, ATTOSECONDS_PER_SECOND / 2));
    }

    #[test]
    fn scale_sub_second_duration() {
        let scaled = scale(Duration::from_millis(500), 0.5);
        assert_eq!(scaled, Duration::from_millis(250));
    }

    #[test]
    fn scale_keeps_zero() {
        assert_eq!(scale(Duration::ZERO, 0.8), Duration::ZERO);
        assert_eq!(scale(Duration::ZERO, 1.0), Duration::ZERO);
    }

    #[test]
    fn scale_keeps_the_sentinel() {
        assert_eq!(scale(Duration::MAX, 0.8), Duration::MAX);
    }

    #[test]
    fn jitter_stays_in_range() {
        let base = Duration::from_millis(100);
        for _ in 0..1_000 {
            let jittered = jitter(base);
            assert!(jittered >= Duration::from_millis(80), "{jittered} below range");
            assert!(jittered <= base, "{jittered} above range");
        }
    }

    #[test]
    fn jitter_of_zero_is_zero() {
        for _ in 0..100 {
            assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
        }
    }
}
