//! WebSocket connection management.
//!
//! This module provides the client's connection layer:
//! - Automatic reconnection with exponential backoff and a single,
//!   cancellable pending-retry timer
//! - Heartbeat ping/pong keepalive
//! - Connection state tracking observable by UI status badges
//! - The wire frame model and JSON codec
//! - A transport trait seam so tests can run against an in-memory session
//!
//! # Example
//!
//! ```ignore
//! use vantage_stream::ws::{StreamClient, StreamConfig};
//!
//! let config = StreamConfig::builder()
//!     .url("wss://api.vantage.app/stream")
//!     .reconnect_enabled(true)
//!     .build();
//!
//! let client = StreamClient::new(config);
//! client.connect();
//! ```

mod client;
mod config;
mod frame;
mod message;
mod state;
mod transport;

pub use client::{StatusHandle, StreamClient, StreamClientBuilder};
pub use config::{StreamConfig, StreamConfigBuilder};
pub use frame::{
    AlertEvent, BotStatusEvent, ControlFrame, EventMessage, FrameCodec, QuoteUpdate, RoutedMessage,
    ServerFrame, SignalEvent, WarningEvent,
};
pub use message::{CloseReason, TransportMessage};
pub use state::ConnectionState;
pub use transport::{
    endpoint_url, StaticToken, TokenProvider, Transport, TransportSink, TransportSource,
    WsTransport,
};
