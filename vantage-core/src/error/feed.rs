//! Feed-related error types.
//!
//! Errors produced while decoding and classifying inbound wire frames.
//! These never affect connection state: a frame that fails to decode is
//! dropped with a log entry and the stream continues.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feed error type for wire frame decoding and routing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedError {
    /// Inbound frame could not be parsed as a known message shape.
    #[error("[Feed] Malformed frame: {reason}")]
    MalformedFrame {
        /// Reason parsing failed.
        reason: String,
    },

    /// Inbound frame carried a `type` tag the client does not recognize.
    #[error("[Feed] Unknown message type: {message_type}")]
    UnknownMessageType {
        /// The unrecognized type tag.
        message_type: String,
    },

    /// Outbound frame could not be serialized.
    #[error("[Feed] Encode failed: {reason}")]
    EncodeFailed {
        /// Reason serialization failed.
        reason: String,
    },
}

impl FeedError {
    /// Returns the severity level of this error.
    ///
    /// All feed errors are warnings: the offending frame is dropped and the
    /// connection continues unaffected.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        super::ErrorSeverity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_frame_display() {
        let error = FeedError::MalformedFrame {
            reason: "missing field `symbol`".to_string(),
        };
        assert!(error.to_string().contains("missing field `symbol`"));
        assert_eq!(error.severity(), crate::error::ErrorSeverity::Warning);
    }

    #[test]
    fn test_unknown_type_display() {
        let error = FeedError::UnknownMessageType {
            message_type: "heartbeat".to_string(),
        };
        assert!(error.to_string().contains("heartbeat"));
    }
}
