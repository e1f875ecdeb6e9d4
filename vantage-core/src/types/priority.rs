//! Notification priority levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority of a notification derived from an inbound event.
///
/// Ordered from least to most urgent so priorities can be compared
/// directly (`Priority::Critical > Priority::High`).
///
/// # Examples
///
/// ```
/// use vantage_core::types::Priority;
///
/// assert!(Priority::Critical > Priority::Low);
/// assert!(Priority::Critical.is_critical());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Informational, lowest urgency.
    Low,
    /// Default urgency.
    Medium,
    /// Elevated urgency; triggers the audible cue.
    High,
    /// Highest urgency; requires explicit user dismissal.
    Critical,
}

impl Priority {
    /// Returns true if this is the critical priority.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }

    /// Returns true if notifications of this priority trigger the audible cue.
    #[must_use]
    pub fn is_audible(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn test_predicates() {
        assert!(Priority::Critical.is_critical());
        assert!(!Priority::High.is_critical());
        assert!(Priority::High.is_audible());
        assert!(Priority::Critical.is_audible());
        assert!(!Priority::Medium.is_audible());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Priority::Critical).unwrap(),
            "\"critical\""
        );
        let parsed: Priority = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, Priority::High);
    }
}
