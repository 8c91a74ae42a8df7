//! Recording sink for bridge tests.

use std::sync::Mutex;

use tracing::trace;

use super::ReadingSink;
use crate::error::{PotError, Result};

/// Sink that records every delivery attempt and optionally fails them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    attempts: Mutex<Vec<i64>>,
    failure: Option<String>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails with `reason`, like an API that is down.
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            failure: Some(reason.to_string()),
        }
    }

    /// Values the bridge tried to deliver, in order.
    #[must_use]
    pub fn attempts(&self) -> Vec<i64> {
        self.attempts.lock().unwrap().clone()
    }

    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

impl ReadingSink for RecordingSink {
    fn target(&self) -> &str {
        "recording-sink"
    }

    async fn deliver(&self, value: i64) -> Result<()> {
        trace!(value, "Recording delivery");
        self.attempts.lock().unwrap().push(value);
        match &self.failure {
            Some(reason) => Err(PotError::Delivery {
                url: self.target().to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}
