use thiserror::Error;

/// Top-level error type for the watchdog runtime.
#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatchdogError {
    /// True for caller-side aborts: explicit cancellation or an expired deadline.
    /// These are never retried and always propagate.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// True for failures that are expected to clear up on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connect(_) => true,
            Self::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Walks an `anyhow` chain looking for a cancellation-class [`WatchdogError`].
pub fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<WatchdogError>())
        .any(WatchdogError::is_cancellation)
}

/// 429 and the gateway-ish 5xx family.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

pub type Result<T> = std::result::Result<T, WatchdogError>;
