//! Backoff delays for retryable operations.

/// Jittered exponential backoff that saturates instead of overflowing.
pub mod backoff;
pub use backoff::BackoffStrategy;

/// Random scaling of durations to spread out retries.
pub mod jitter;
pub use jitter::{JITTER_MAX, JITTER_MIN, jitter};
