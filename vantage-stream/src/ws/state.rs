//! Connection state management.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Externally visible connection state.
///
/// This is the `status` surface consumed by UI connection badges. The state
/// machine is `disconnected → connecting → connected → (error | disconnected)`;
/// both `error` and a clean closure land back in `disconnected` before any
/// scheduled reconnect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,
    /// Attempting to establish a session.
    Connecting,
    /// Session established.
    Connected,
    /// The session ended with a transport error.
    Error,
}

impl ConnectionState {
    /// Returns true if the connection is active.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns true if a connection attempt is in flight.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Returns true if the connection is down (cleanly or after an error).
    #[must_use]
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Internal state tracking for the streaming client.
#[derive(Debug)]
pub(crate) struct InternalState {
    /// Current connection state.
    pub state: ConnectionState,
    /// Number of reconnection attempts since the last successful connection.
    pub reconnect_attempts: u32,
    /// Last successful connection time.
    pub last_connected: Option<Instant>,
    /// Last message received time.
    pub last_message: Option<Instant>,
    /// Last pong received time.
    pub last_pong: Option<Instant>,
    /// Most recent transport error, if any.
    pub last_error: Option<String>,
}

impl Default for InternalState {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_attempts: 0,
            last_connected: None,
            last_message: None,
            last_pong: None,
            last_error: None,
        }
    }
}

impl InternalState {
    /// Creates a new internal state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the connection as connected and resets the attempt counter.
    pub fn mark_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.reconnect_attempts = 0;
        self.last_connected = Some(Instant::now());
        self.last_error = None;
    }

    /// Marks the connection as disconnected.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Marks a connection attempt in flight.
    pub fn mark_connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// Marks a transport error and records its description.
    pub fn mark_error(&mut self, reason: impl Into<String>) {
        self.state = ConnectionState::Error;
        self.last_error = Some(reason.into());
    }

    /// Records a scheduled reconnection attempt.
    pub fn record_attempt(&mut self) {
        self.reconnect_attempts = self.reconnect_attempts.saturating_add(1);
    }

    /// Records that a message was received.
    pub fn record_message(&mut self) {
        self.last_message = Some(Instant::now());
    }

    /// Records that a pong was received.
    pub fn record_pong(&mut self) {
        self.last_pong = Some(Instant::now());
    }
}
