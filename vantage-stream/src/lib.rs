//! # Vantage Stream
//!
//! Real-time streaming client for the Vantage investment-management
//! platform: market quotes and trading-assistant signals over a single
//! long-lived WebSocket session.
//!
//! This crate provides:
//! - A connection manager with automatic reconnection and exponential backoff
//! - A ref-counted subscription registry that survives reconnects
//! - A message dispatcher fanning inbound frames out to per-symbol and
//!   per-category consumers
//!
//! # Architecture
//!
//! All connection state lives in a single supervisor task per client.
//! Public operations (`connect`, `disconnect`, `subscribe`, `unsubscribe`)
//! send commands to that task and return immediately; their effects are
//! observed through the connection status and registered consumers.
//!
//! # Example
//!
//! ```ignore
//! use vantage_stream::prelude::*;
//!
//! let config = StreamConfig::builder()
//!     .url("wss://api.vantage.app/stream")
//!     .auto_connect(true)
//!     .reconnect_enabled(true)
//!     .build();
//!
//! let client = StreamClient::new(config);
//! let aapl = Symbol::new("AAPL")?;
//! let _watch = client.on_quote(aapl.clone(), |quote| {
//!     println!("{} @ {}", quote.symbol, quote.price);
//! });
//! client.subscribe(aapl);
//! ```

#![warn(missing_docs)]

/// WebSocket connection management
pub mod ws;

/// Subscription registry (the source of truth for active topics)
pub mod registry;

/// Inbound message dispatch and consumer fan-out
pub mod dispatch;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dispatch::{ConsumerHandle, MessageDispatcher};
    pub use crate::registry::SubscriptionRegistry;
    pub use crate::ws::{
        ConnectionState, ControlFrame, EventMessage, QuoteUpdate, StreamClient, StreamConfig,
        StreamConfigBuilder, TokenProvider,
    };
    pub use vantage_core::types::{EventCategory, Priority, Symbol};
}
