//! Streaming client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the streaming client.
///
/// Contains the endpoint, reconnection policy, and heartbeat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// WebSocket endpoint URL.
    pub url: String,

    /// Whether to open the session as soon as the client is created.
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,

    /// Whether automatic reconnection is enabled.
    #[serde(default = "default_reconnect_enabled")]
    pub reconnect_enabled: bool,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Initial reconnection delay in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Maximum reconnection delay in milliseconds (for exponential backoff).
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// Backoff multiplier for exponential backoff.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Heartbeat/ping interval in milliseconds.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Whether to send ping frames automatically.
    #[serde(default = "default_auto_ping")]
    pub auto_ping: bool,
}

fn default_auto_connect() -> bool {
    false
}

fn default_reconnect_enabled() -> bool {
    true
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_delay_ms() -> u64 {
    1_000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_auto_ping() -> bool {
    true
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auto_connect: default_auto_connect(),
            reconnect_enabled: default_reconnect_enabled(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            auto_ping: default_auto_ping(),
        }
    }
}

impl StreamConfig {
    /// Creates a new builder for `StreamConfig`.
    #[must_use]
    pub fn builder() -> StreamConfigBuilder {
        StreamConfigBuilder::default()
    }

    /// Returns the connection timeout as a Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the heartbeat interval as a Duration.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Calculates the reconnect delay for a given attempt using exponential backoff.
    ///
    /// `attempt` is 1-based: the first retry after a drop uses the initial delay.
    #[must_use]
    pub fn reconnect_delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let delay =
            self.reconnect_delay_ms as f64 * self.backoff_multiplier.powi(exponent as i32);
        let capped = delay.min(self.max_reconnect_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }
}

/// Builder for `StreamConfig`.
#[derive(Debug, Default)]
pub struct StreamConfigBuilder {
    url: Option<String>,
    auto_connect: Option<bool>,
    reconnect_enabled: Option<bool>,
    connect_timeout_ms: Option<u64>,
    reconnect_delay_ms: Option<u64>,
    max_reconnect_delay_ms: Option<u64>,
    backoff_multiplier: Option<f64>,
    heartbeat_interval_ms: Option<u64>,
    auto_ping: Option<bool>,
}

impl StreamConfigBuilder {
    /// Sets the WebSocket endpoint URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets whether the client connects on creation.
    #[must_use]
    pub fn auto_connect(mut self, enabled: bool) -> Self {
        self.auto_connect = Some(enabled);
        self
    }

    /// Sets whether reconnection is enabled.
    #[must_use]
    pub fn reconnect_enabled(mut self, enabled: bool) -> Self {
        self.reconnect_enabled = Some(enabled);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Sets the initial reconnection delay.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay_ms = Some(delay.as_millis() as u64);
        self
    }

    /// Sets the maximum reconnection delay.
    #[must_use]
    pub fn max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay_ms = Some(delay.as_millis() as u64);
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = Some(multiplier);
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    /// Sets whether auto ping is enabled.
    #[must_use]
    pub fn auto_ping(mut self, enabled: bool) -> Self {
        self.auto_ping = Some(enabled);
        self
    }

    /// Builds the `StreamConfig`.
    #[must_use]
    pub fn build(self) -> StreamConfig {
        StreamConfig {
            url: self.url.unwrap_or_default(),
            auto_connect: self.auto_connect.unwrap_or_else(default_auto_connect),
            reconnect_enabled: self
                .reconnect_enabled
                .unwrap_or_else(default_reconnect_enabled),
            connect_timeout_ms: self
                .connect_timeout_ms
                .unwrap_or_else(default_connect_timeout_ms),
            reconnect_delay_ms: self
                .reconnect_delay_ms
                .unwrap_or_else(default_reconnect_delay_ms),
            max_reconnect_delay_ms: self
                .max_reconnect_delay_ms
                .unwrap_or_else(default_max_reconnect_delay_ms),
            backoff_multiplier: self
                .backoff_multiplier
                .unwrap_or_else(default_backoff_multiplier),
            heartbeat_interval_ms: self
                .heartbeat_interval_ms
                .unwrap_or_else(default_heartbeat_interval_ms),
            auto_ping: self.auto_ping.unwrap_or_else(default_auto_ping),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = StreamConfig::builder()
            .url("wss://api.vantage.app/stream")
            .auto_connect(true)
            .reconnect_enabled(true)
            .connect_timeout(Duration::from_secs(15))
            .build();

        assert_eq!(config.url, "wss://api.vantage.app/stream");
        assert!(config.auto_connect);
        assert!(config.reconnect_enabled);
        assert_eq!(config.connect_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_config_defaults() {
        let config = StreamConfig::default();

        assert!(config.url.is_empty());
        assert!(!config.auto_connect);
        assert!(config.reconnect_enabled);
        assert_eq!(config.connect_timeout_ms, 10_000);
        assert!(config.auto_ping);
    }

    #[test]
    fn test_exponential_backoff() {
        let config = StreamConfig::builder()
            .reconnect_delay(Duration::from_secs(1))
            .max_reconnect_delay(Duration::from_secs(30))
            .backoff_multiplier(2.0)
            .build();

        assert_eq!(config.reconnect_delay_for(1), Duration::from_secs(1));
        assert_eq!(config.reconnect_delay_for(2), Duration::from_secs(2));
        assert_eq!(config.reconnect_delay_for(3), Duration::from_secs(4));
        assert_eq!(config.reconnect_delay_for(4), Duration::from_secs(8));
        // Capped at the maximum
        assert_eq!(config.reconnect_delay_for(10), Duration::from_secs(30));
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = StreamConfig::builder()
            .url("wss://api.vantage.app/stream")
            .heartbeat_interval(Duration::from_secs(20))
            .build();

        let json = serde_json::to_string(&config).unwrap();
        let parsed: StreamConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.url, parsed.url);
        assert_eq!(config.heartbeat_interval_ms, parsed.heartbeat_interval_ms);
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let parsed: StreamConfig =
            serde_json::from_str(r#"{"url":"wss://api.vantage.app/stream"}"#).unwrap();
        assert!(parsed.reconnect_enabled);
        assert_eq!(parsed.reconnect_delay_ms, 1_000);
        assert_eq!(parsed.max_reconnect_delay_ms, 30_000);
    }
}
