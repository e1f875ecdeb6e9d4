//! Transport abstraction and the production WebSocket implementation.
//!
//! The connection manager talks to a [`Transport`], never to a socket
//! directly. [`WsTransport`] is the production implementation on top of
//! `tokio-tungstenite`; tests inject an in-memory implementation to drive
//! the client deterministically.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::Message as TungsteniteMessage;
use tokio_tungstenite::tungstenite::Error as TungsteniteError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use vantage_core::error::NetworkError;

use super::message::{CloseReason, TransportMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Supplies the authentication token attached at connect time.
///
/// The token lives in externally-managed storage (the host application's
/// session layer); the streaming client reads it once per connection
/// attempt and never refreshes it.
pub trait TokenProvider: Send + Sync {
    /// Returns the current token, or `None` to connect unauthenticated.
    fn token(&self) -> Option<String>;
}

/// A fixed token, for hosts that resolve the token themselves.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Builds the connect URL, attaching the token as a query parameter.
///
/// The token value is percent-encoded so opaque tokens containing query
/// metacharacters survive intact.
#[must_use]
pub fn endpoint_url(base: &str, token: Option<&str>) -> String {
    match token {
        Some(token) if !token.is_empty() => {
            let separator = if base.contains('?') { '&' } else { '?' };
            format!("{base}{separator}token={}", urlencoding::encode(token))
        }
        _ => base.to_string(),
    }
}

/// Write half of an established session.
#[async_trait]
pub trait TransportSink: Send {
    /// Sends a frame to the server.
    async fn send(&mut self, message: TransportMessage) -> Result<(), NetworkError>;

    /// Closes the session.
    async fn close(&mut self) -> Result<(), NetworkError>;
}

/// Read half of an established session.
#[async_trait]
pub trait TransportSource: Send {
    /// Receives the next frame. `None` means the session ended.
    async fn next_message(&mut self) -> Option<Result<TransportMessage, NetworkError>>;
}

/// Factory for duplex sessions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a session to `url`, returning its write and read halves.
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportSource>), NetworkError>;
}

/// Production transport backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Creates a new WebSocket transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn map_error(error: &TungsteniteError) -> NetworkError {
        match error {
            TungsteniteError::Tls(e) => NetworkError::Tls {
                reason: e.to_string(),
            },
            TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed => {
                NetworkError::ConnectionClosed {
                    reason: error.to_string(),
                }
            }
            TungsteniteError::Io(e) => NetworkError::ConnectionFailed {
                reason: e.to_string(),
            },
            other => NetworkError::WebSocket {
                reason: other.to_string(),
            },
        }
    }

    fn to_tungstenite(message: TransportMessage) -> TungsteniteMessage {
        match message {
            TransportMessage::Text(s) => TungsteniteMessage::Text(s),
            TransportMessage::Binary(b) => TungsteniteMessage::Binary(b),
            TransportMessage::Ping(b) => TungsteniteMessage::Ping(b),
            TransportMessage::Pong(b) => TungsteniteMessage::Pong(b),
            TransportMessage::Close(reason) => TungsteniteMessage::Close(reason.map(|r| {
                CloseFrame {
                    code: CloseCode::from(r.code),
                    reason: r.reason.into(),
                }
            })),
        }
    }

    fn from_tungstenite(message: TungsteniteMessage) -> Option<TransportMessage> {
        match message {
            TungsteniteMessage::Text(s) => Some(TransportMessage::Text(s)),
            TungsteniteMessage::Binary(b) => Some(TransportMessage::Binary(b)),
            TungsteniteMessage::Ping(b) => Some(TransportMessage::Ping(b)),
            TungsteniteMessage::Pong(b) => Some(TransportMessage::Pong(b)),
            TungsteniteMessage::Close(frame) => {
                Some(TransportMessage::Close(frame.map(|f| CloseReason {
                    code: f.code.into(),
                    reason: f.reason.to_string(),
                })))
            }
            TungsteniteMessage::Frame(_) => None,
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportSource>), NetworkError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Self::map_error(&e))?;
        let (sink, stream) = ws_stream.split();
        Ok((
            Box::new(WsSink { sink }),
            Box::new(WsSource { stream }),
        ))
    }
}

struct WsSink {
    sink: SplitSink<WsStream, TungsteniteMessage>,
}

#[async_trait]
impl TransportSink for WsSink {
    async fn send(&mut self, message: TransportMessage) -> Result<(), NetworkError> {
        self.sink
            .send(WsTransport::to_tungstenite(message))
            .await
            .map_err(|e| WsTransport::map_error(&e))
    }

    async fn close(&mut self) -> Result<(), NetworkError> {
        self.sink
            .close()
            .await
            .map_err(|e| WsTransport::map_error(&e))
    }
}

struct WsSource {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl TransportSource for WsSource {
    async fn next_message(&mut self) -> Option<Result<TransportMessage, NetworkError>> {
        loop {
            match self.stream.next().await? {
                Ok(message) => {
                    // Raw frames are a tungstenite internal; skip and read on
                    if let Some(converted) = WsTransport::from_tungstenite(message) {
                        return Some(Ok(converted));
                    }
                }
                Err(e) => return Some(Err(WsTransport::map_error(&e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_without_token() {
        assert_eq!(
            endpoint_url("wss://api.vantage.app/stream", None),
            "wss://api.vantage.app/stream"
        );
        assert_eq!(
            endpoint_url("wss://api.vantage.app/stream", Some("")),
            "wss://api.vantage.app/stream"
        );
    }

    #[test]
    fn test_endpoint_url_with_token() {
        assert_eq!(
            endpoint_url("wss://api.vantage.app/stream", Some("abc123")),
            "wss://api.vantage.app/stream?token=abc123"
        );
        assert_eq!(
            endpoint_url("wss://api.vantage.app/stream?v=2", Some("abc123")),
            "wss://api.vantage.app/stream?v=2&token=abc123"
        );
    }

    #[test]
    fn test_endpoint_url_encodes_token() {
        assert_eq!(
            endpoint_url("wss://api.vantage.app/stream", Some("a&b#c+d")),
            "wss://api.vantage.app/stream?token=a%26b%23c%2Bd"
        );
    }

    #[test]
    fn test_static_token() {
        let provider = StaticToken("secret".to_string());
        assert_eq!(provider.token().as_deref(), Some("secret"));
    }

    #[test]
    fn test_message_conversion_roundtrip() {
        let text = WsTransport::to_tungstenite(TransportMessage::text("hello"));
        assert!(matches!(text, TungsteniteMessage::Text(_)));

        let back = WsTransport::from_tungstenite(TungsteniteMessage::Text("hello".to_string()));
        assert_eq!(back, Some(TransportMessage::Text("hello".to_string())));

        let ping = WsTransport::from_tungstenite(TungsteniteMessage::Ping(vec![1]));
        assert_eq!(ping, Some(TransportMessage::Ping(vec![1])));

        let close =
            WsTransport::from_tungstenite(TungsteniteMessage::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "bye".into(),
            })));
        match close {
            Some(TransportMessage::Close(Some(reason))) => {
                assert_eq!(reason.code, 1000);
                assert_eq!(reason.reason, "bye");
            }
            other => panic!("unexpected conversion: {other:?}"),
        }
    }
}
