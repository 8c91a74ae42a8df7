//! Mock instrument implementation for testing.
//!
//! Replies are scripted per command and every operation is recorded, so
//! tests can assert exactly what the bridge asked the device.
//!
//! # Example
//!
//! ```rust,ignore
//! use potlog::device::mock::{MockInstrument, MockReply, Operation};
//! use potlog::device::Instrument;
//!
//! let mut mock = MockInstrument::sensor_kit().with_reply("MEAS:POT?", MockReply::line("512"));
//! mock.connect().unwrap();
//! assert_eq!(mock.query("MEAS:POT?").unwrap().as_deref(), Some("512"));
//! mock.assert_contains(&Operation::Query { command: "MEAS:POT?".into() });
//! ```

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use super::{Instrument, IDENTITY_QUERY};
use crate::config::DEFAULT_IDENTITY;
use crate::error::{PotError, Result};

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Connect,
    Query { command: String },
    Disconnect,
}

/// Scripted reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// A response line, returned trimmed like the real session does
    Line(String),
    /// No response before the read timeout
    Silent,
    /// Channel failure during the exchange
    Fail(String),
}

impl MockReply {
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }
}

/// Mock instrument for testing without real hardware.
#[derive(Debug)]
pub struct MockInstrument {
    port: String,
    connected: bool,
    connect_failure: Option<String>,
    queued: HashMap<String, VecDeque<MockReply>>,
    replies: HashMap<String, MockReply>,
    operation_log: Vec<Operation>,
}

impl MockInstrument {
    /// Create a mock with no scripted replies; every command is silent.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            connected: false,
            connect_failure: None,
            queued: HashMap::new(),
            replies: HashMap::new(),
            operation_log: Vec::new(),
        }
    }

    /// Mock that identifies as the stock sensor kit.
    #[must_use]
    pub fn sensor_kit() -> Self {
        Self::new("/dev/mock0").with_identity(DEFAULT_IDENTITY)
    }

    // === Configuration ===

    /// Answer `*IDN?` with `identity`.
    #[must_use]
    pub fn with_identity(self, identity: &str) -> Self {
        self.with_reply(IDENTITY_QUERY, MockReply::line(identity))
    }

    /// Answer `command` with `reply` whenever nothing is queued for it.
    #[must_use]
    pub fn with_reply(mut self, command: &str, reply: MockReply) -> Self {
        self.replies.insert(command.to_string(), reply);
        self
    }

    /// Queue replies for `command`, consumed in order before the standing reply.
    #[must_use]
    pub fn with_queued<I>(mut self, command: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = MockReply>,
    {
        self.queued
            .entry(command.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Make `connect` fail with `reason`.
    #[must_use]
    pub fn failing_connect(mut self, reason: &str) -> Self {
        self.connect_failure = Some(reason.to_string());
        self
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operation_log
    }

    /// Commands sent to the device, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<&str> {
        self.operation_log
            .iter()
            .filter_map(|op| match op {
                Operation::Query { command } => Some(command.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of times `command` was sent.
    #[must_use]
    pub fn query_count(&self, command: &str) -> usize {
        self.queries().iter().filter(|c| **c == command).count()
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        assert!(
            self.operation_log.contains(expected),
            "Expected operation {expected:?} not found in: {:#?}",
            self.operation_log
        );
    }

    /// Assert `command` was never sent.
    ///
    /// # Panics
    ///
    /// Panics if the command appears in the log.
    pub fn assert_never_queried(&self, command: &str) {
        assert_eq!(
            self.query_count(command),
            0,
            "Expected no '{command}' queries, log: {:#?}",
            self.operation_log
        );
    }

    // === Internal Helpers ===

    fn record_op(&mut self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operation_log.push(op);
    }

    fn next_reply(&mut self, command: &str) -> MockReply {
        if let Some(reply) = self.queued.get_mut(command).and_then(VecDeque::pop_front) {
            return reply;
        }
        self.replies
            .get(command)
            .cloned()
            .unwrap_or(MockReply::Silent)
    }
}

impl Instrument for MockInstrument {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<()> {
        self.record_op(Operation::Connect);
        if let Some(reason) = &self.connect_failure {
            return Err(PotError::DeviceOpenFailed {
                port: self.port.clone(),
                reason: reason.clone(),
            });
        }
        debug!(port = %self.port, "Mock instrument connected");
        self.connected = true;
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<Option<String>> {
        if !self.connected {
            return Err(PotError::NotConnected);
        }
        self.record_op(Operation::Query {
            command: command.to_string(),
        });

        match self.next_reply(command) {
            MockReply::Line(text) => {
                let trimmed = text.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            MockReply::Silent => Ok(None),
            MockReply::Fail(reason) => Err(PotError::DeviceCommunication {
                command: command.to_string(),
                reason,
            }),
        }
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.record_op(Operation::Disconnect);
            self.connected = false;
        }
    }
}
