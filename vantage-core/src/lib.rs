//! # Vantage Core
//!
//! Foundation types for the Vantage real-time streaming client.
//!
//! This crate provides:
//! - Validated newtype wrappers ([`types::Symbol`])
//! - Message classification types ([`types::EventCategory`], [`types::Priority`])
//! - The error hierarchy shared by the streaming crates
//!
//! It carries no I/O and no async code; everything here is plain data
//! consumed by `vantage-stream` and `vantage-notify`.

#![warn(missing_docs)]

/// Error types and severity classification
pub mod error;

/// NewType wrappers and classification enums
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{ErrorSeverity, FeedError, NetworkError};
    pub use crate::types::{EventCategory, Priority, Symbol, ValidationError};
}
