//! Notification fan-out for the streaming feed.
//!
//! Converts advisory events from the stream into on-screen
//! [`Notification`](notification::Notification) records and manages their
//! lifecycle in a [`NotificationCenter`](center::NotificationCenter):
//! a bounded active list with priority-aware eviction, auto-dismiss for
//! everything below critical, and an audible cue for high-priority entries.

pub mod center;
pub mod notification;

/// Commonly used notification types.
pub mod prelude {
    pub use crate::center::{Chime, NotificationCenter, NotifyConfig, NullChime};
    pub use crate::notification::{Notification, ADVISORY_MARKER};
}
