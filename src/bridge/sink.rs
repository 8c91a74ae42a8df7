//! Delivery of parsed readings to the reading store API.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::trace;

use crate::error::{PotError, Result};

/// Somewhere the bridge can hand a reading to.
pub trait ReadingSink {
    /// Human-readable destination, for logs.
    fn target(&self) -> &str;

    /// Deliver one reading. A failure is reported once and never retried.
    fn deliver(&self, value: i64) -> impl Future<Output = Result<()>> + Send;
}

/// Wire payload of `POST /api/readings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryPayload {
    pub value: i64,
}

/// Posts readings to the API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    /// Client for `url` whose every call is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PotError::Other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn delivery_error(&self, err: &reqwest::Error) -> PotError {
        PotError::Delivery {
            url: self.url.clone(),
            reason: err.to_string(),
        }
    }
}

impl ReadingSink for HttpSink {
    fn target(&self) -> &str {
        &self.url
    }

    async fn deliver(&self, value: i64) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&DeliveryPayload { value })
            .send()
            .await
            .map_err(|e| self.delivery_error(&e))?;

        let status = response.status();
        response
            .error_for_status()
            .map_err(|e| self.delivery_error(&e))?;

        trace!(%status, value, "API accepted reading");
        Ok(())
    }
}
