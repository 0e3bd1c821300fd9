//! Alert delivery: the per-task deduplication gate and the sinks alerts go to.

pub mod gate;
pub mod log;
pub mod webhook;

pub use gate::{NotificationGate, DEFAULT_RETENTION_FLOOR};
pub use log::LogNotifier;
pub use webhook::{AppriseNotifier, ApprisePayload};
