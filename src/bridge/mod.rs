//! Device bridge: poll the instrument and forward readings to the API.
//!
//! # States
//!
//! ```text
//! Disconnected ──start()──▶ Connecting ──ok──▶ IdentityCheck ──match──▶ Polling
//!                               │                   │                      │
//!                             error             mismatch               interrupt
//!                               ▼                   ▼                      ▼
//!                           Terminated ◀────────────┴──────────────────────┘
//! ```
//!
//! `Terminated` is the closed, final state: the session has been
//! disconnected and the bridge does nothing further.
//!
//! Only the two startup checks are fatal. Inside the poll loop every
//! failure becomes a [`PollOutcome`], is logged, and the loop carries on
//! after the usual interval.

pub mod mock;
mod sink;

pub use sink::{DeliveryPayload, HttpSink, ReadingSink};

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::device::{Instrument, IDENTITY_QUERY, MEASURE_QUERY};
use crate::error::{PotError, Result};

/// Lifecycle of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    Disconnected,
    Connecting,
    IdentityCheck,
    Polling,
    Terminated,
}

/// What happened in one poll iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Reading parsed and accepted by the sink.
    Delivered { value: i64 },
    /// The instrument sent nothing before the read timeout.
    NoData,
    /// The instrument sent something that is not an integer.
    NonInteger { raw: String },
    /// The exchange with the instrument failed.
    QueryFailed { reason: String },
    /// Reading parsed but the sink rejected it; it is dropped.
    DeliveryFailed { value: i64, reason: String },
}

/// Totals reported when the poll loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeExit {
    pub iterations: u64,
    pub delivered: u64,
    pub skipped: u64,
}

impl BridgeExit {
    fn record(&mut self, outcome: &PollOutcome) {
        self.iterations += 1;
        if matches!(outcome, PollOutcome::Delivered { .. }) {
            self.delivered += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Parse an instrument reply as a reading value.
pub fn parse_reading(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Owns the instrument session and the delivery sink.
pub struct Bridge<I, S> {
    instrument: I,
    sink: S,
    identity: String,
    interval: Duration,
    state: BridgeState,
}

impl<I: Instrument, S: ReadingSink> Bridge<I, S> {
    pub fn new(instrument: I, sink: S, identity: impl Into<String>, interval: Duration) -> Self {
        Self {
            instrument,
            sink,
            identity: identity.into(),
            interval,
            state: BridgeState::Disconnected,
        }
    }

    pub const fn state(&self) -> BridgeState {
        self.state
    }

    pub const fn instrument(&self) -> &I {
        &self.instrument
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Connect and verify the instrument's identity.
    ///
    /// On success the bridge is `Polling`. On failure it is `Terminated`
    /// with the session closed.
    ///
    /// # Errors
    ///
    /// `DeviceOpenFailed` if the port cannot be opened, `WrongInstrument`
    /// if `*IDN?` is answered with anything but the expected identity
    /// (or not answered at all).
    #[instrument(skip(self), fields(port = %self.instrument.port_name()))]
    pub fn start(&mut self) -> Result<()> {
        self.state = BridgeState::Connecting;
        if let Err(e) = self.instrument.connect() {
            error!(error = %e, "Could not connect");
            self.shutdown();
            return Err(e);
        }

        self.state = BridgeState::IdentityCheck;
        let reported = match self.instrument.query(IDENTITY_QUERY) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Identity query failed");
                None
            }
        };
        info!(identity = reported.as_deref().unwrap_or("<none>"), "Instrument ID");

        if reported.as_deref() == Some(self.identity.as_str()) {
            self.state = BridgeState::Polling;
            Ok(())
        } else {
            error!(expected = %self.identity, "Connected to wrong instrument");
            self.shutdown();
            Err(PotError::WrongInstrument {
                expected: self.identity.clone(),
                actual: reported,
            })
        }
    }

    /// One iteration: measure, parse, deliver. Never fails; the outcome
    /// says what happened.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let raw = match self.instrument.query(MEASURE_QUERY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                warn!("No data from sensor");
                return PollOutcome::NoData;
            }
            Err(e) => {
                error!(error = %e, command = MEASURE_QUERY, "Sensor query failed");
                return PollOutcome::QueryFailed {
                    reason: e.to_string(),
                };
            }
        };

        let Some(value) = parse_reading(&raw) else {
            warn!(raw = %raw, "Got non-integer value from sensor");
            return PollOutcome::NonInteger { raw };
        };
        info!(value, "Read value");

        match self.sink.deliver(value).await {
            Ok(()) => {
                info!(value, destination = self.sink.target(), "Posted reading to API");
                PollOutcome::Delivered { value }
            }
            Err(e) => {
                error!(value, error = %e, "Could not post to API, is it running?");
                PollOutcome::DeliveryFailed {
                    value,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Poll until `cancel` fires, sleeping `interval` between iterations.
    ///
    /// Cancellation is observed between iterations and cuts the sleep
    /// short; an exchange already in flight finishes first.
    pub async fn run(&mut self, cancel: &CancellationToken) -> BridgeExit {
        info!(
            destination = self.sink.target(),
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Starting data loop"
        );

        let mut exit = BridgeExit::default();
        while !cancel.is_cancelled() {
            let outcome = self.poll_once().await;
            exit.record(&outcome);

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(
            iterations = exit.iterations,
            delivered = exit.delivered,
            "Shutting down"
        );
        self.shutdown();
        exit
    }

    /// Close the session and enter the terminal state. Idempotent.
    pub fn shutdown(&mut self) {
        self.instrument.disconnect();
        self.state = BridgeState::Terminated;
    }
}

/// Full bridge lifecycle: start, poll until cancelled, disconnect.
///
/// The instrument is disconnected on every path out of this function.
/// `start` blocks the calling thread (settle delay, serial reads); run this
/// on a multi-thread runtime so signal handling stays on the workers.
pub async fn run_bridge<I: Instrument, S: ReadingSink>(
    bridge: &mut Bridge<I, S>,
    cancel: &CancellationToken,
) -> Result<BridgeExit> {
    let result = match bridge.start() {
        Ok(()) => Ok(bridge.run(cancel).await),
        Err(e) => Err(e),
    };
    bridge.shutdown();
    result
}
