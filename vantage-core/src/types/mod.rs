//! NewType wrappers and classification enums for the streaming feed.
//!
//! # Types
//!
//! - [`Symbol`] - Validated ticker symbol identifiers (the subscribable topics)
//! - [`EventCategory`] - Message classes of the advisory-signal feed
//! - [`Priority`] - Notification priority levels

mod category;
mod priority;
mod symbol;

pub use category::EventCategory;
pub use priority::Priority;
pub use symbol::Symbol;

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Symbol format is invalid
    #[error("invalid symbol format: {0}")]
    InvalidSymbol(String),

    /// Symbol is empty
    #[error("symbol cannot be empty")]
    EmptySymbol,

    /// Event category string is not recognized
    #[error("unknown event category: {0}")]
    UnknownCategory(String),
}
