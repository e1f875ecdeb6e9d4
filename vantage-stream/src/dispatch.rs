//! Inbound message dispatch and consumer fan-out.
//!
//! The dispatcher parses raw inbound frames and demultiplexes them: quotes
//! route by symbol, events by category. Many consumers may register for the
//! same route; all are invoked in registration order. A panicking consumer
//! is caught and logged at the dispatch boundary and never prevents
//! delivery to the others, nor does it touch connection state.
//!
//! Consumer lists are snapshotted before invocation (copy-on-iterate), so
//! removing a consumer from inside a callback is safe; removal is
//! idempotent.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

use vantage_core::types::{EventCategory, Symbol};

use crate::ws::{EventMessage, FrameCodec, QuoteUpdate, RoutedMessage};

/// Consumer of quote messages for one symbol.
pub type QuoteConsumer = Arc<dyn Fn(&QuoteUpdate) + Send + Sync>;

/// Consumer of event messages for one category.
pub type EventConsumer = Arc<dyn Fn(&EventMessage) + Send + Sync>;

/// Handle returned on registration, used to remove the consumer again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerHandle {
    id: u64,
    route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Quote(Symbol),
    Event(EventCategory),
}

/// Demultiplexes inbound frames to registered consumers.
///
/// Messages are delivered in wire-arrival order; the dispatcher performs no
/// reordering or batching. Nothing is delivered across a reconnect boundary:
/// frames in flight during a drop are simply lost, which is acceptable for
/// latest-value feeds.
#[derive(Default)]
pub struct MessageDispatcher {
    codec: FrameCodec,
    next_id: AtomicU64,
    quote_consumers: RwLock<HashMap<Symbol, Vec<(u64, QuoteConsumer)>>>,
    event_consumers: RwLock<HashMap<EventCategory, Vec<(u64, EventConsumer)>>>,
}

impl MessageDispatcher {
    /// Creates a dispatcher with no registered consumers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a consumer for every quote of `symbol`.
    ///
    /// Consumers for the same symbol are invoked in registration order.
    pub fn on_quote(
        &self,
        symbol: Symbol,
        consumer: impl Fn(&QuoteUpdate) + Send + Sync + 'static,
    ) -> ConsumerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.quote_consumers
            .write()
            .entry(symbol.clone())
            .or_default()
            .push((id, Arc::new(consumer)));
        ConsumerHandle {
            id,
            route: Route::Quote(symbol),
        }
    }

    /// Registers a consumer for every event of `category`.
    pub fn on_event(
        &self,
        category: EventCategory,
        consumer: impl Fn(&EventMessage) + Send + Sync + 'static,
    ) -> ConsumerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.event_consumers
            .write()
            .entry(category)
            .or_default()
            .push((id, Arc::new(consumer)));
        ConsumerHandle {
            id,
            route: Route::Event(category),
        }
    }

    /// Removes a previously registered consumer.
    ///
    /// Idempotent, and safe to call from inside a consumer while a message
    /// is being dispatched.
    pub fn remove(&self, handle: &ConsumerHandle) {
        match &handle.route {
            Route::Quote(symbol) => {
                let mut consumers = self.quote_consumers.write();
                if let Some(list) = consumers.get_mut(symbol) {
                    list.retain(|(id, _)| *id != handle.id);
                    if list.is_empty() {
                        consumers.remove(symbol);
                    }
                }
            }
            Route::Event(category) => {
                let mut consumers = self.event_consumers.write();
                if let Some(list) = consumers.get_mut(category) {
                    list.retain(|(id, _)| *id != handle.id);
                    if list.is_empty() {
                        consumers.remove(category);
                    }
                }
            }
        }
    }

    /// Parses and routes one raw inbound frame.
    ///
    /// Malformed frames are dropped and logged; they never affect connection
    /// state or other consumers.
    pub fn dispatch_text(&self, text: &str) {
        match self.codec.decode(text) {
            Ok(frame) => self.dispatch(frame.into_routed()),
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
            }
        }
    }

    /// Routes an already-decoded message.
    pub fn dispatch(&self, message: RoutedMessage) {
        match message {
            RoutedMessage::Quote(quote) => {
                let snapshot: Vec<QuoteConsumer> = self
                    .quote_consumers
                    .read()
                    .get(&quote.symbol)
                    .map(|list| list.iter().map(|(_, c)| Arc::clone(c)).collect())
                    .unwrap_or_default();
                if snapshot.is_empty() {
                    debug!(symbol = %quote.symbol, "Quote with no registered consumers");
                    return;
                }
                for consumer in snapshot {
                    if catch_unwind(AssertUnwindSafe(|| consumer(&quote))).is_err() {
                        error!(symbol = %quote.symbol, "Quote consumer panicked");
                    }
                }
            }
            RoutedMessage::Event(event) => {
                let category = event.category();
                let snapshot: Vec<EventConsumer> = self
                    .event_consumers
                    .read()
                    .get(&category)
                    .map(|list| list.iter().map(|(_, c)| Arc::clone(c)).collect())
                    .unwrap_or_default();
                for consumer in snapshot {
                    if catch_unwind(AssertUnwindSafe(|| consumer(&event))).is_err() {
                        error!(category = %category, "Event consumer panicked");
                    }
                }
            }
        }
    }

    /// Returns the number of consumers registered for a symbol.
    #[must_use]
    pub fn quote_consumer_count(&self, symbol: &Symbol) -> usize {
        self.quote_consumers
            .read()
            .get(symbol)
            .map_or(0, Vec::len)
    }

    /// Returns the number of consumers registered for a category.
    #[must_use]
    pub fn event_consumer_count(&self, category: EventCategory) -> usize {
        self.event_consumers
            .read()
            .get(&category)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("quote_routes", &self.quote_consumers.read().len())
            .field("event_routes", &self.event_consumers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn quote_json(symbol: &str, price: f64) -> String {
        format!(r#"{{"type":"quote","symbol":"{symbol}","price":{price}}}"#)
    }

    #[test]
    fn test_routing_isolation_between_symbols() {
        let dispatcher = MessageDispatcher::new();
        let aapl_prices = Arc::new(Mutex::new(Vec::new()));
        let msft_prices = Arc::new(Mutex::new(Vec::new()));

        let aapl_sink = Arc::clone(&aapl_prices);
        let _h1 = dispatcher.on_quote(sym("AAPL"), move |q| aapl_sink.lock().push(q.price));
        let msft_sink = Arc::clone(&msft_prices);
        let _h2 = dispatcher.on_quote(sym("MSFT"), move |q| msft_sink.lock().push(q.price));

        dispatcher.dispatch_text(&quote_json("AAPL", 190.0));
        dispatcher.dispatch_text(&quote_json("MSFT", 420.0));
        dispatcher.dispatch_text(&quote_json("AAPL", 191.0));

        assert_eq!(*aapl_prices.lock(), vec![190.0, 191.0]);
        assert_eq!(*msft_prices.lock(), vec![420.0]);
    }

    #[test]
    fn test_fanout_in_registration_order() {
        let dispatcher = MessageDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let sink = Arc::clone(&order);
            let _handle = dispatcher.on_quote(sym("AAPL"), move |_| sink.lock().push(tag));
        }

        dispatcher.dispatch_text(&quote_json("AAPL", 190.0));
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_consumer_does_not_block_others() {
        let dispatcher = MessageDispatcher::new();
        let delivered = Arc::new(Mutex::new(0u32));

        let _h1 = dispatcher.on_quote(sym("AAPL"), |_| panic!("consumer bug"));
        let sink = Arc::clone(&delivered);
        let _h2 = dispatcher.on_quote(sym("AAPL"), move |_| *sink.lock() += 1);

        dispatcher.dispatch_text(&quote_json("AAPL", 190.0));
        assert_eq!(*delivered.lock(), 1);
    }

    #[test]
    fn test_event_routing_by_category() {
        let dispatcher = MessageDispatcher::new();
        let signals = Arc::new(Mutex::new(0u32));
        let warnings = Arc::new(Mutex::new(0u32));

        let sink = Arc::clone(&signals);
        let _h1 = dispatcher.on_event(EventCategory::NewSignal, move |_| *sink.lock() += 1);
        let sink = Arc::clone(&warnings);
        let _h2 = dispatcher.on_event(EventCategory::RiskWarning, move |_| *sink.lock() += 1);

        dispatcher.dispatch_text(r#"{"type":"signal","symbol":"TSLA","side":"buy"}"#);
        dispatcher.dispatch_text(r#"{"type":"warning","message":"drawdown limit"}"#);
        dispatcher.dispatch_text(r#"{"type":"signal","symbol":"NVDA","side":"sell"}"#);

        assert_eq!(*signals.lock(), 2);
        assert_eq!(*warnings.lock(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dispatcher = MessageDispatcher::new();
        let count = Arc::new(Mutex::new(0u32));

        let sink = Arc::clone(&count);
        let handle = dispatcher.on_quote(sym("AAPL"), move |_| *sink.lock() += 1);
        assert_eq!(dispatcher.quote_consumer_count(&sym("AAPL")), 1);

        dispatcher.remove(&handle);
        dispatcher.remove(&handle);
        assert_eq!(dispatcher.quote_consumer_count(&sym("AAPL")), 0);

        dispatcher.dispatch_text(&quote_json("AAPL", 190.0));
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_removal_during_dispatch_is_safe() {
        let dispatcher = Arc::new(MessageDispatcher::new());
        let later = Arc::new(Mutex::new(0u32));

        // First consumer removes the second while a message is in flight;
        // the snapshot means the second still sees the current message.
        let handle_slot: Arc<Mutex<Option<ConsumerHandle>>> = Arc::new(Mutex::new(None));
        let d = Arc::clone(&dispatcher);
        let slot = Arc::clone(&handle_slot);
        let _h1 = dispatcher.on_quote(sym("AAPL"), move |_| {
            if let Some(handle) = slot.lock().take() {
                d.remove(&handle);
            }
        });
        let sink = Arc::clone(&later);
        let h2 = dispatcher.on_quote(sym("AAPL"), move |_| *sink.lock() += 1);
        *handle_slot.lock() = Some(h2);

        dispatcher.dispatch_text(&quote_json("AAPL", 190.0));
        assert_eq!(*later.lock(), 1);

        // Removed for subsequent messages
        dispatcher.dispatch_text(&quote_json("AAPL", 191.0));
        assert_eq!(*later.lock(), 1);
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let dispatcher = MessageDispatcher::new();
        let count = Arc::new(Mutex::new(0u32));
        let sink = Arc::clone(&count);
        let _handle = dispatcher.on_quote(sym("AAPL"), move |_| *sink.lock() += 1);

        dispatcher.dispatch_text("not json at all");
        dispatcher.dispatch_text(r#"{"type":"telemetry","cpu":0.4}"#);
        dispatcher.dispatch_text(&quote_json("AAPL", 190.0));

        // Only the valid frame was delivered
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_quote_with_no_consumers_is_dropped_quietly() {
        let dispatcher = MessageDispatcher::new();
        // Must not panic or error
        dispatcher.dispatch_text(&quote_json("GOOG", 2800.0));
    }
}
