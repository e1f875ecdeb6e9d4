//! Event categories of the advisory-signal feed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Subscribable message class of the advisory-signal feed.
///
/// Quote messages are routed by [`super::Symbol`]; everything else on the
/// wire is an event routed by one of these categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    /// A new trading signal from the advisory engine.
    NewSignal,
    /// An alert about an open position.
    PositionAlert,
    /// A portfolio risk warning.
    RiskWarning,
    /// An operational status report from the trading bot.
    BotStatus,
}

impl EventCategory {
    /// All categories, in a fixed order (used to register fan-out consumers).
    pub const ALL: [Self; 4] = [
        Self::NewSignal,
        Self::PositionAlert,
        Self::RiskWarning,
        Self::BotStatus,
    ];

    /// Returns the category as its kebab-case wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewSignal => "new-signal",
            Self::PositionAlert => "position-alert",
            Self::RiskWarning => "risk-warning",
            Self::BotStatus => "bot-status",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new-signal" => Ok(Self::NewSignal),
            "position-alert" => Ok(Self::PositionAlert),
            "risk-warning" => Ok(Self::RiskWarning),
            "bot-status" => Ok(Self::BotStatus),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_roundtrip() {
        for category in EventCategory::ALL {
            let parsed: EventCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_unknown_category() {
        assert!(matches!(
            "price-move".parse::<EventCategory>(),
            Err(ValidationError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&EventCategory::NewSignal).unwrap(),
            "\"new-signal\""
        );
        let parsed: EventCategory = serde_json::from_str("\"bot-status\"").unwrap();
        assert_eq!(parsed, EventCategory::BotStatus);
    }
}
