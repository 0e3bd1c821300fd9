//! Retrying transport for idempotent HTTP calls.
//!
//! Every request runs inside a [`watchdog_core::CallContext`]; transient
//! failures are retried with capped exponential backoff, permanent ones are
//! returned immediately, and cancellation aborts at once.

pub mod client;
pub mod retry;
pub mod transport;

pub use client::{build_client, ClientOptions};
pub use retry::{classify_error, classify_status, Classification, RetryPolicy};
pub use transport::RetryableTransport;
