//! Error types for the streaming client.
//!
//! The client runs in steady state without a thrown-error channel: transport
//! failures drive the connection state machine, malformed frames are dropped
//! and logged, and consumer panics are isolated at the dispatch boundary.
//! The types here exist for the places that *do* return `Result` (transport
//! establishment, frame codec) and for classifying failures in logs.
//!
//! # Error Hierarchy
//!
//! - [`NetworkError`] - Connection and transport errors
//! - [`FeedError`] - Wire frame parsing and classification errors

use serde::{Deserialize, Serialize};
use std::fmt;

mod feed;
mod network;

pub use feed::FeedError;
pub use network::NetworkError;

/// Error severity levels for categorizing errors.
///
/// Severity levels help determine the appropriate response to an error:
/// - `Fatal`: Unrecoverable errors that end the current connection for good
/// - `Recoverable`: Errors the reconnect machinery can retry through
/// - `Warning`: Non-critical issues that are logged and otherwise ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Unrecoverable error.
    Fatal,
    /// Error that can be retried or recovered from.
    Recoverable,
    /// Non-critical issue.
    Warning,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal => write!(f, "fatal"),
            Self::Recoverable => write!(f, "recoverable"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(ErrorSeverity::Fatal.to_string(), "fatal");
        assert_eq!(ErrorSeverity::Recoverable.to_string(), "recoverable");
        assert_eq!(ErrorSeverity::Warning.to_string(), "warning");
    }

    #[test]
    fn test_severity_serde() {
        let json = serde_json::to_string(&ErrorSeverity::Recoverable).unwrap();
        assert_eq!(json, "\"recoverable\"");
    }
}
