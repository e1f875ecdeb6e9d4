//! Symbol type for representing ticker identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Symbol type - used for representing ticker identifiers.
///
/// Wraps a `String` value with validation to ensure proper format.
/// Symbols are typically tickers such as "AAPL" or "BRK.B". The streaming
/// layer treats symbols as opaque topics; no intrinsic ordering is implied.
///
/// # Examples
///
/// ```
/// use vantage_core::types::Symbol;
///
/// let symbol = Symbol::new("AAPL").unwrap();
/// assert_eq!(symbol.as_str(), "AAPL");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new `Symbol` from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptySymbol` if the string is empty.
    /// Returns `ValidationError::InvalidSymbol` if the format is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use vantage_core::types::Symbol;
    ///
    /// let symbol = Symbol::new("MSFT").unwrap();
    /// assert!(Symbol::new("").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        // Tickers: alphanumerics plus the separators brokers actually use
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidSymbol(s));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
