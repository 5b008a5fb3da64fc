//! A signed, high-resolution duration made of whole seconds and attoseconds.
use std::fmt;
use std::time::Duration as StdDuration;

/// Number of attoseconds in one second.
pub const ATTOSECONDS_PER_SECOND: i64 = 1_000_000_000_000_000_000;

const ATTOSECONDS_PER_MILLISECOND: i64 = 1_000_000_000_000_000;
const ATTOSECONDS_PER_NANOSECOND: i64 = 1_000_000_000;

/// A time quantity stored as a seconds component and an attosecond component.
///
/// Every value built through the constructors is normalized: the attosecond component
/// lies in `0..ATTOSECONDS_PER_SECOND` and any carry lives in the seconds component.
/// The only exception is [`Duration::MAX`], which holds the largest value in both
/// components and stands for "effectively forever".
///
/// The derived ordering compares seconds first, then attoseconds. It is correct for
/// normalized values, and [`Duration::MAX`] compares greater than all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    seconds: i64,
    attoseconds: i64,
}

impl Duration {
    /// A duration of zero.
    pub const ZERO: Duration = Duration {
        seconds: 0,
        attoseconds: 0,
    };

    /// The largest representable duration. Backoff strategies return it once their
    /// arithmetic overflows.
    pub const MAX: Duration = Duration {
        seconds: i64::MAX,
        attoseconds: i64::MAX,
    };

    /// Create a duration from seconds and attoseconds, folding attosecond overflow into
    /// the seconds component.
    ///
    /// # Panics
    ///
    /// Panics if the carry does not fit into the seconds component.
    pub const fn new(seconds: i64, attoseconds: i64) -> Duration {
        match Duration::checked_new(seconds, attoseconds) {
            Some(duration) => duration,
            None => panic!("overflow in Duration::new"),
        }
    }

    /// Like [`Duration::new`], but returns `None` when the carry overflows.
    pub const fn checked_new(seconds: i64, attoseconds: i64) -> Option<Duration> {
        let carry = attoseconds.div_euclid(ATTOSECONDS_PER_SECOND);
        let attoseconds = attoseconds.rem_euclid(ATTOSECONDS_PER_SECOND);
        match seconds.checked_add(carry) {
            Some(seconds) => Some(Duration {
                seconds,
                attoseconds,
            }),
            None => None,
        }
    }

    /// Create a duration of whole seconds.
    pub const fn from_secs(seconds: i64) -> Duration {
        Duration {
            seconds,
            attoseconds: 0,
        }
    }

    /// Create a duration from milliseconds.
    pub const fn from_millis(millis: i64) -> Duration {
        Duration {
            seconds: millis.div_euclid(1_000),
            attoseconds: millis.rem_euclid(1_000) * ATTOSECONDS_PER_MILLISECOND,
        }
    }

    /// The `(seconds, attoseconds)` components.
    pub const fn components(&self) -> (i64, i64) {
        (self.seconds, self.attoseconds)
    }

    pub const fn is_negative(&self) -> bool {
        self.seconds < 0
    }

    pub const fn is_zero(&self) -> bool {
        self.seconds == 0 && self.attoseconds == 0
    }

    /// Convert into a [`std::time::Duration`].
    ///
    /// Negative values become zero, sub-nanosecond precision is truncated, and
    /// [`Duration::MAX`] becomes [`std::time::Duration::MAX`].
    pub fn to_std(&self) -> StdDuration {
        if *self == Duration::MAX {
            return StdDuration::MAX;
        }
        if self.is_negative() {
            return StdDuration::ZERO;
        }
        // Normalized attoseconds are below one second, so the nanos fit in a u32.
        let nanos = (self.attoseconds / ATTOSECONDS_PER_NANOSECOND) as u32;
        StdDuration::new(self.seconds as u64, nanos)
    }
}

impl From<StdDuration> for Duration {
    /// Saturates to [`Duration::MAX`] when the seconds do not fit into an `i64`.
    fn from(duration: StdDuration) -> Self {
        match i64::try_from(duration.as_secs()) {
            Ok(seconds) => Duration {
                seconds,
                attoseconds: i64::from(duration.subsec_nanos()) * ATTOSECONDS_PER_NANOSECOND,
            },
            Err(_) => Duration::MAX,
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Duration::MAX {
            return f.write_str("max");
        }
        if self.is_negative() && self.attoseconds > 0 {
            // (-2, 0.25s) reads as -1.75s
            let whole = -(self.seconds as i128 + 1);
            let fraction = ATTOSECONDS_PER_SECOND - self.attoseconds;
            write!(f, "-{whole}.{fraction:018}s")
        } else {
            write!(f, "{}.{:018}s", self.seconds, self.attoseconds)
        }
    }
}
