//! # Persevere
//!
//! Retry asynchronous operations that fail transiently, waiting a jittered and
//! exponentially growing delay between attempts.
//!
//! `persevere` drives an operation until it succeeds, runs out of attempts, or is
//! cancelled. Cancellation is cooperative and explicit: a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) is handed to every attempt,
//! and firing it ends the wait between attempts at once.
//!
//! ## Features
//!
//! - Bounded retries through [`unsync::retry`]
//! - Unbounded retries through [`unsync::retry_indefinite`]
//! - Jittered exponential backoff that saturates instead of overflowing, through
//!   [`strategy::BackoffStrategy`]
//! - A reserved [`Cancelled`] error that is never retried
//!
//! ## Usage Examples
//!
//! ```rust
//! use persevere::{Cancellation, Cancelled};
//! use persevere::unsync::{RetryConfig, retry};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug, thiserror::Error)]
//! enum ApiError {
//!     #[error("service unavailable")]
//!     Unavailable,
//!     #[error(transparent)]
//!     Cancelled(#[from] Cancelled),
//! }
//!
//! impl Cancellation for ApiError {
//!     fn is_cancellation(&self) -> bool {
//!         matches!(self, ApiError::Cancelled(_))
//!     }
//! }
//!
//! async fn call_api(attempt: u32) -> Result<&'static str, ApiError> {
//!     if attempt < 3 { Err(ApiError::Unavailable) } else { Ok("payload") }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cancel = CancellationToken::new();
//! let config = RetryConfig::default()
//!     .with_backoff_factor(3)
//!     .with_backoff_duration(Duration::from_millis(5));
//! let mut attempts = 0;
//!
//! let result = retry(5, config, &cancel, |_cancel| {
//!     attempts += 1;
//!     call_api(attempts)
//! })
//! .await;
//!
//! assert_eq!(result.unwrap(), "payload");
//! # }
//! ```
pub mod clock;
pub mod duration;
pub mod error;
pub mod strategy;
pub mod unsync;

pub use duration::Duration;
pub use error::{Cancellation, Cancelled};
