/// Outcome of evaluating one observation within a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult<T> {
    /// What was measured, e.g. a balance or a pull request's age.
    pub value: T,
    /// Whether the observation warrants an alert.
    pub alertable: bool,
    /// Dedup keys to run through the gate when alertable.
    pub keys: Vec<String>,
}

impl<T> CheckResult<T> {
    pub fn new(value: T, alertable: bool, key: impl Into<String>) -> Self {
        Self {
            value,
            alertable,
            keys: vec![key.into()],
        }
    }

    /// Keys that should be considered for notification.
    pub fn alert_keys(&self) -> &[String] {
        if self.alertable {
            &self.keys
        } else {
            &[]
        }
    }
}
