//! The cancellation signal and how errors are checked for it.
use std::error::Error;
use std::io;

/// The surrounding task was told to stop.
///
/// Retry drivers never retry this error. They return it as soon as the operation reports
/// it, and they raise it themselves when cancellation interrupts a backoff suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, thiserror::Error)]
#[error("operation was cancelled")]
pub struct Cancelled;

/// Error types that can carry the [`Cancelled`] signal.
///
/// `From<Cancelled>` lets a driver surface cancellation through the operation's own error
/// type, and [`Cancellation::is_cancellation`] lets it recognise the signal when the
/// operation returns it.
///
/// # Examples
///
/// ```
/// use persevere::{Cancellation, Cancelled};
///
/// #[derive(Debug, thiserror::Error)]
/// enum FetchError {
///     #[error("connection reset")]
///     Reset,
///     #[error(transparent)]
///     Cancelled(#[from] Cancelled),
/// }
///
/// impl Cancellation for FetchError {
///     fn is_cancellation(&self) -> bool {
///         matches!(self, FetchError::Cancelled(_))
///     }
/// }
///
/// assert!(FetchError::from(Cancelled).is_cancellation());
/// assert!(!FetchError::Reset.is_cancellation());
/// ```
pub trait Cancellation: From<Cancelled> {
    /// Whether this error is the cancellation signal.
    fn is_cancellation(&self) -> bool;
}

impl Cancellation for Cancelled {
    fn is_cancellation(&self) -> bool {
        true
    }
}

impl Cancellation for Box<dyn Error + Send + Sync> {
    fn is_cancellation(&self) -> bool {
        self.is::<Cancelled>()
    }
}

impl From<Cancelled> for io::Error {
    fn from(cancelled: Cancelled) -> Self {
        io::Error::new(io::ErrorKind::Interrupted, cancelled)
    }
}

impl Cancellation for io::Error {
    fn is_cancellation(&self) -> bool {
        self.get_ref().is_some_and(|inner| inner.is::<Cancelled>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_cancellation() {
        assert!(Cancelled.is_cancellation());
        assert_eq!(Cancelled.to_string(), "operation was cancelled");
    }

    #[test]
    fn boxed_errors_are_classified_by_type() {
        let cancelled: Box<dyn Error + Send + Sync> = Cancelled.into();
        let other: Box<dyn Error + Send + Sync> = "connection refused".into();
        assert!(cancelled.is_cancellation());
        assert!(!other.is_cancellation());
    }

    #[test]
    fn io_errors_are_classified_by_payload() {
        let cancelled = io::Error::from(Cancelled);
        assert_eq!(cancelled.kind(), io::ErrorKind::Interrupted);
        assert!(cancelled.is_cancellation());

        assert!(!io::Error::from(io::ErrorKind::Interrupted).is_cancellation());
        assert!(!io::Error::other("timed out").is_cancellation());
    }
}
