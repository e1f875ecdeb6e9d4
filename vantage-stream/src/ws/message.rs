//! Transport-level message types.
//!
//! [`TransportMessage`] is the frame shape exchanged with a transport
//! implementation, independent of the underlying WebSocket library. The
//! application-level JSON frames live in [`super::frame`].

use serde::{Deserialize, Serialize};

/// A single transport-level frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMessage {
    /// Text frame (all application frames are JSON text).
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
    /// Ping frame.
    Ping(Vec<u8>),
    /// Pong frame.
    Pong(Vec<u8>),
    /// Close frame.
    Close(Option<CloseReason>),
}

/// Close frame reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReason {
    /// Close code.
    pub code: u16,
    /// Close reason text.
    pub reason: String,
}

impl TransportMessage {
    /// Creates a text message.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Creates a ping message.
    #[must_use]
    pub fn ping(data: impl Into<Vec<u8>>) -> Self {
        Self::Ping(data.into())
    }

    /// Creates a close message.
    #[must_use]
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Self::Close(Some(CloseReason {
            code,
            reason: reason.into(),
        }))
    }

    /// Returns true if this is a text message.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true if this is a close message.
    #[must_use]
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close(_))
    }

    /// Returns the text content if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}
