//! Structured logging for the watchdog.
//!
//! Handles subscriber setup, secret redaction, and alert-decision events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{log_alert, AlertEvent, AlertLogEntry};
pub use logger::init_logger;
pub use redact::{redact_sensitive_data, redact_url};
