use std::error::Error;

/// Failure reported by the fake services of the recovery tests.
#[derive(Debug)]
pub struct ServiceError {
    pub reason: &'static str,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "service request failed: {}", self.reason)
    }
}

impl Error for ServiceError {}
