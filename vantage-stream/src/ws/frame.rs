//! Application wire frames and JSON codec.
//!
//! One JSON object per frame. Inbound frames are discriminated by a `type`
//! tag (`quote`, `signal`, `alert`, `warning`, `status`); outbound control
//! frames by an `action` tag (`subscribe`, `unsubscribe`). Payload fields
//! beyond the typed shells are preserved untouched in `extra` maps — the
//! client routes messages, it does not interpret them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use vantage_core::error::FeedError;
use vantage_core::types::{EventCategory, Symbol};

/// Outbound control frame: `{ "action": "subscribe" | "unsubscribe", "symbol": … }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlFrame {
    /// Register interest in a symbol's quote stream.
    Subscribe {
        /// The symbol to subscribe to.
        symbol: Symbol,
    },
    /// Withdraw interest in a symbol's quote stream.
    Unsubscribe {
        /// The symbol to unsubscribe from.
        symbol: Symbol,
    },
}

impl ControlFrame {
    /// Creates a subscribe frame.
    #[must_use]
    pub fn subscribe(symbol: Symbol) -> Self {
        Self::Subscribe { symbol }
    }

    /// Creates an unsubscribe frame.
    #[must_use]
    pub fn unsubscribe(symbol: Symbol) -> Self {
        Self::Unsubscribe { symbol }
    }

    /// Returns the symbol this frame refers to.
    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Subscribe { symbol } | Self::Unsubscribe { symbol } => symbol,
        }
    }
}

/// Inbound frame: `{ "type": "quote" | "signal" | "alert" | "warning" | "status", … }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// A market quote, routed by symbol.
    Quote(QuoteUpdate),
    /// A new trading signal from the advisory engine.
    Signal(SignalEvent),
    /// An alert about an open position.
    Alert(AlertEvent),
    /// A portfolio risk warning.
    Warning(WarningEvent),
    /// An operational status report from the trading bot.
    Status(BotStatusEvent),
}

impl ServerFrame {
    /// Splits the frame into its routing class.
    #[must_use]
    pub fn into_routed(self) -> RoutedMessage {
        match self {
            Self::Quote(quote) => RoutedMessage::Quote(quote),
            Self::Signal(event) => RoutedMessage::Event(EventMessage::NewSignal(event)),
            Self::Alert(event) => RoutedMessage::Event(EventMessage::PositionAlert(event)),
            Self::Warning(event) => RoutedMessage::Event(EventMessage::RiskWarning(event)),
            Self::Status(event) => RoutedMessage::Event(EventMessage::BotStatus(event)),
        }
    }
}

/// A decoded inbound frame classified for routing.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedMessage {
    /// Routed by symbol to quote consumers.
    Quote(QuoteUpdate),
    /// Routed by category to event consumers.
    Event(EventMessage),
}

/// An event-side inbound message, grouped by [`EventCategory`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventMessage {
    /// A `signal` frame.
    NewSignal(SignalEvent),
    /// An `alert` frame.
    PositionAlert(AlertEvent),
    /// A `warning` frame.
    RiskWarning(WarningEvent),
    /// A `status` frame.
    BotStatus(BotStatusEvent),
}

impl EventMessage {
    /// Returns the category this event is routed by.
    #[must_use]
    pub fn category(&self) -> EventCategory {
        match self {
            Self::NewSignal(_) => EventCategory::NewSignal,
            Self::PositionAlert(_) => EventCategory::PositionAlert,
            Self::RiskWarning(_) => EventCategory::RiskWarning,
            Self::BotStatus(_) => EventCategory::BotStatus,
        }
    }
}

/// A market quote update. Immutable after receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteUpdate {
    /// The quoted symbol.
    pub symbol: Symbol,
    /// Last traded price.
    pub price: f64,
    /// Absolute change since the previous close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    /// Percentage change since the previous close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    /// Traded volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Server-side timestamp, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Payload of a `signal` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    /// Symbol the signal applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    /// Suggested side, e.g. "buy" or "sell".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    /// Model confidence in the range 0.0..=1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Remaining payload fields, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of an `alert` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Symbol of the affected position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Remaining payload fields, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `warning` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningEvent {
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Remaining payload fields, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a `status` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotStatusEvent {
    /// Operational state reported by the server, e.g. "running" or "error".
    pub status: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Remaining payload fields, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BotStatusEvent {
    /// Returns true if the server reported an operational error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }
}

/// JSON codec for wire frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Creates a new codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decodes an inbound JSON frame.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::MalformedFrame`] if the text is not a JSON object
    /// or its payload does not match the tagged shape, and
    /// [`FeedError::UnknownMessageType`] if the `type` tag is unrecognized.
    pub fn decode(&self, text: &str) -> Result<ServerFrame, FeedError> {
        let value: Value = serde_json::from_str(text).map_err(|e| FeedError::MalformedFrame {
            reason: e.to_string(),
        })?;

        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| FeedError::MalformedFrame {
                reason: "missing `type` tag".to_string(),
            })?;

        if !matches!(tag, "quote" | "signal" | "alert" | "warning" | "status") {
            return Err(FeedError::UnknownMessageType {
                message_type: tag.to_string(),
            });
        }

        serde_json::from_value(value).map_err(|e| FeedError::MalformedFrame {
            reason: e.to_string(),
        })
    }

    /// Encodes an outbound control frame to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::EncodeFailed`] if serialization fails.
    pub fn encode(&self, frame: &ControlFrame) -> Result<String, FeedError> {
        serde_json::to_string(frame).map_err(|e| FeedError::EncodeFailed {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_frame_wire_shape() {
        let frame = ControlFrame::subscribe(Symbol::new("AAPL").unwrap());
        let json = FrameCodec::new().encode(&frame).unwrap();
        assert_eq!(json, r#"{"action":"subscribe","symbol":"AAPL"}"#);

        let frame = ControlFrame::unsubscribe(Symbol::new("MSFT").unwrap());
        let json = FrameCodec::new().encode(&frame).unwrap();
        assert_eq!(json, r#"{"action":"unsubscribe","symbol":"MSFT"}"#);
    }

    #[test]
    fn test_decode_quote() {
        let codec = FrameCodec::new();
        let frame = codec
            .decode(r#"{"type":"quote","symbol":"AAPL","price":189.5,"change_percent":0.8}"#)
            .unwrap();
        match frame {
            ServerFrame::Quote(quote) => {
                assert_eq!(quote.symbol.as_str(), "AAPL");
                assert!((quote.price - 189.5).abs() < f64::EPSILON);
                assert_eq!(quote.change_percent, Some(0.8));
                assert_eq!(quote.volume, None);
            }
            other => panic!("expected quote, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_signal_preserves_extra_fields() {
        let codec = FrameCodec::new();
        let frame = codec
            .decode(
                r#"{"type":"signal","symbol":"TSLA","side":"buy","confidence":0.92,"model":"momentum-v3"}"#,
            )
            .unwrap();
        match frame.into_routed() {
            RoutedMessage::Event(EventMessage::NewSignal(signal)) => {
                assert_eq!(signal.side.as_deref(), Some("buy"));
                assert_eq!(signal.extra.get("model").and_then(Value::as_str), Some("momentum-v3"));
            }
            other => panic!("expected new-signal event, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_status_error() {
        let codec = FrameCodec::new();
        let frame = codec
            .decode(r#"{"type":"status","status":"error","message":"order rejected"}"#)
            .unwrap();
        match frame {
            ServerFrame::Status(status) => {
                assert!(status.is_error());
                assert_eq!(status.message.as_deref(), Some("order rejected"));
            }
            other => panic!("expected status, got {other:?}"),
        }
    }

    #[test]
    fn test_routing_categories() {
        let codec = FrameCodec::new();
        let cases = [
            (r#"{"type":"signal"}"#, EventCategory::NewSignal),
            (r#"{"type":"alert"}"#, EventCategory::PositionAlert),
            (r#"{"type":"warning"}"#, EventCategory::RiskWarning),
            (
                r#"{"type":"status","status":"running"}"#,
                EventCategory::BotStatus,
            ),
        ];
        for (json, expected) in cases {
            match codec.decode(json).unwrap().into_routed() {
                RoutedMessage::Event(event) => assert_eq!(event.category(), expected),
                RoutedMessage::Quote(_) => panic!("expected event for {json}"),
            }
        }
    }

    #[test]
    fn test_decode_malformed() {
        let codec = FrameCodec::new();
        assert!(matches!(
            codec.decode("not json"),
            Err(FeedError::MalformedFrame { .. })
        ));
        assert!(matches!(
            codec.decode(r#"{"symbol":"AAPL"}"#),
            Err(FeedError::MalformedFrame { .. })
        ));
        // Known tag but payload missing a required field
        assert!(matches!(
            codec.decode(r#"{"type":"quote","price":1.0}"#),
            Err(FeedError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_decode_unknown_type() {
        let codec = FrameCodec::new();
        assert!(matches!(
            codec.decode(r#"{"type":"heartbeat"}"#),
            Err(FeedError::UnknownMessageType { message_type }) if message_type == "heartbeat"
        ));
    }
}
