//! UI-facing notification records.
//!
//! A [`Notification`] is a time-bounded representation of an inbound event,
//! distinct from the wire message it came from. Conversion from event
//! payloads lives here; lifecycle management lives in
//! [`center`](crate::center).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vantage_core::types::{EventCategory, Priority};
use vantage_stream::ws::{AlertEvent, BotStatusEvent, EventMessage, SignalEvent, WarningEvent};

/// Marker every signal notification carries. Product invariant: the feed is
/// advisory and must never read as an instruction to trade.
pub const ADVISORY_MARKER: &str = "Advisory only, manual action required.";

/// A single on-screen notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique per notification instance.
    pub id: Uuid,
    /// Event category the notification was derived from.
    pub category: EventCategory,
    /// Display and eviction priority.
    pub priority: Priority,
    /// Short heading, e.g. "New signal".
    pub title: String,
    /// Body text shown under the heading.
    pub message: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set by explicit dismissal; drives the removal transition.
    pub dismissed: bool,
}

impl Notification {
    /// Creates a notification with a fresh id and the current time.
    #[must_use]
    pub fn new(
        category: EventCategory,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            priority,
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
            dismissed: false,
        }
    }

    /// Converts an event payload into a notification.
    ///
    /// Returns `None` for events with no on-screen representation, such as
    /// routine bot status updates.
    #[must_use]
    pub fn from_event(event: &EventMessage) -> Option<Self> {
        match event {
            EventMessage::NewSignal(signal) => Some(Self::from_signal(signal)),
            EventMessage::PositionAlert(alert) => Some(Self::from_alert(alert)),
            EventMessage::RiskWarning(warning) => Some(Self::from_warning(warning)),
            EventMessage::BotStatus(status) => Self::from_bot_status(status),
        }
    }

    /// Builds the advisory notification for a trade signal.
    #[must_use]
    pub fn from_signal(signal: &SignalEvent) -> Self {
        let mut body = String::new();
        if let Some(symbol) = &signal.symbol {
            body.push_str(symbol.as_str());
        }
        if let Some(side) = &signal.side {
            if !body.is_empty() {
                body.push(' ');
            }
            body.push_str(&side.to_uppercase());
        }
        if let Some(confidence) = signal.confidence {
            body.push_str(&format!(" ({:.0}% confidence)", confidence * 100.0));
        }
        if let Some(message) = &signal.message {
            if !body.is_empty() {
                body.push_str(": ");
            }
            body.push_str(message);
        }
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(ADVISORY_MARKER);

        Self::new(EventCategory::NewSignal, Priority::Medium, "New signal", body)
    }

    /// Builds the notification for a position alert.
    #[must_use]
    pub fn from_alert(alert: &AlertEvent) -> Self {
        let body = match (&alert.symbol, &alert.message) {
            (Some(symbol), Some(message)) => format!("{symbol}: {message}"),
            (Some(symbol), None) => format!("Position alert for {symbol}"),
            (None, Some(message)) => message.clone(),
            (None, None) => "Position alert".to_string(),
        };
        Self::new(
            EventCategory::PositionAlert,
            Priority::High,
            "Position alert",
            body,
        )
    }

    /// Builds the notification for a risk warning.
    #[must_use]
    pub fn from_warning(warning: &WarningEvent) -> Self {
        let body = warning
            .message
            .clone()
            .unwrap_or_else(|| "Risk threshold breached".to_string());
        Self::new(
            EventCategory::RiskWarning,
            Priority::High,
            "Risk warning",
            body,
        )
    }

    /// Builds the critical notification for a bot error, or `None` when the
    /// status event reports normal operation.
    #[must_use]
    pub fn from_bot_status(status: &BotStatusEvent) -> Option<Self> {
        if !status.is_error() {
            return None;
        }
        let body = status
            .message
            .clone()
            .unwrap_or_else(|| "The trading bot reported an operational error".to_string());
        Some(Self::new(
            EventCategory::BotStatus,
            Priority::Critical,
            "Bot: error",
            body,
        ))
    }

    /// Returns true if the notification requires explicit dismissal.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.priority.is_critical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use vantage_core::types::Symbol;

    #[test]
    fn test_signal_notification_carries_advisory_marker() {
        let signal = SignalEvent {
            symbol: Some(Symbol::new("TSLA").unwrap()),
            side: Some("buy".to_string()),
            confidence: Some(0.72),
            message: None,
            extra: Map::new(),
        };
        let notification = Notification::from_signal(&signal);

        assert_eq!(notification.category, EventCategory::NewSignal);
        assert_eq!(notification.priority, Priority::Medium);
        assert!(notification.message.contains("TSLA BUY (72% confidence)"));
        assert!(notification.message.contains(ADVISORY_MARKER));
    }

    #[test]
    fn test_bare_signal_still_carries_marker() {
        let signal = SignalEvent {
            symbol: None,
            side: None,
            confidence: None,
            message: None,
            extra: Map::new(),
        };
        let notification = Notification::from_signal(&signal);
        assert_eq!(notification.message, ADVISORY_MARKER);
    }

    #[test]
    fn test_bot_error_is_critical() {
        let status = BotStatusEvent {
            status: "ERROR".to_string(),
            message: Some("strategy halted".to_string()),
            extra: Map::new(),
        };
        let notification = Notification::from_bot_status(&status).unwrap();

        assert_eq!(notification.title, "Bot: error");
        assert_eq!(notification.priority, Priority::Critical);
        assert!(notification.is_critical());
        assert_eq!(notification.message, "strategy halted");
    }

    #[test]
    fn test_routine_bot_status_produces_nothing() {
        let status = BotStatusEvent {
            status: "running".to_string(),
            message: None,
            extra: Map::new(),
        };
        assert!(Notification::from_bot_status(&status).is_none());
    }

    #[test]
    fn test_alert_and_warning_are_high_priority() {
        let alert = AlertEvent {
            symbol: Some(Symbol::new("AAPL").unwrap()),
            message: Some("stop level reached".to_string()),
            extra: Map::new(),
        };
        let warning = WarningEvent {
            message: None,
            extra: Map::new(),
        };

        assert_eq!(Notification::from_alert(&alert).priority, Priority::High);
        assert_eq!(
            Notification::from_alert(&alert).message,
            "AAPL: stop level reached"
        );
        assert_eq!(Notification::from_warning(&warning).priority, Priority::High);
    }

    #[test]
    fn test_ids_are_unique_per_instance() {
        let warning = WarningEvent {
            message: None,
            extra: Map::new(),
        };
        let a = Notification::from_warning(&warning);
        let b = Notification::from_warning(&warning);
        assert_ne!(a.id, b.id);
    }
}
