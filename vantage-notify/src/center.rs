//! Bounded notification lifecycle management.
//!
//! [`NotificationCenter`] holds the active on-screen set: a configurable
//! display budget with priority-aware eviction, auto-dismiss timers for
//! everything below critical, and an audible cue for high-priority entries
//! through the [`Chime`] seam.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use vantage_core::types::Priority;
use vantage_stream::dispatch::ConsumerHandle;
use vantage_stream::ws::StreamClient;

use crate::notification::Notification;

fn default_max_active() -> usize {
    5
}

fn default_auto_dismiss_ms() -> u64 {
    5_000
}

fn default_removal_transition_ms() -> u64 {
    300
}

/// Notification center configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Maximum number of simultaneously displayed notifications.
    #[serde(default = "default_max_active")]
    pub max_active: usize,
    /// Time from creation to automatic removal, for non-critical entries.
    #[serde(default = "default_auto_dismiss_ms")]
    pub auto_dismiss_ms: u64,
    /// Delay between explicit dismissal and final removal, covering the
    /// removal transition shown on screen.
    #[serde(default = "default_removal_transition_ms")]
    pub removal_transition_ms: u64,
    /// Starts the audible cue muted.
    #[serde(default)]
    pub muted: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_active: default_max_active(),
            auto_dismiss_ms: default_auto_dismiss_ms(),
            removal_transition_ms: default_removal_transition_ms(),
            muted: false,
        }
    }
}

impl NotifyConfig {
    /// Auto-dismiss delay as a [`Duration`].
    #[must_use]
    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_millis(self.auto_dismiss_ms)
    }

    /// Removal transition window as a [`Duration`].
    #[must_use]
    pub fn removal_transition(&self) -> Duration {
        Duration::from_millis(self.removal_transition_ms)
    }
}

/// Audible cue played for high-priority notifications.
///
/// Implementations must be best-effort: playback failure (for example a
/// platform restriction on unprompted audio) is swallowed, never surfaced.
pub trait Chime: Send + Sync {
    /// Plays the cue for a notification of the given priority.
    fn play(&self, priority: Priority);
}

/// A [`Chime`] that plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChime;

impl Chime for NullChime {
    fn play(&self, _priority: Priority) {}
}

struct Inner {
    config: NotifyConfig,
    active: Mutex<Vec<Notification>>,
    muted: AtomicBool,
    chime: Arc<dyn Chime>,
}

/// The active notification set.
///
/// Cheap to clone; all clones share the same list. Must be used inside a
/// Tokio runtime: auto-dismiss and removal timers are spawned tasks.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    /// Creates a center with no audible cue.
    #[must_use]
    pub fn new(config: NotifyConfig) -> Self {
        Self::with_chime(config, Arc::new(NullChime))
    }

    /// Creates a center that plays `chime` for high-priority entries.
    #[must_use]
    pub fn with_chime(config: NotifyConfig, chime: Arc<dyn Chime>) -> Self {
        let muted = AtomicBool::new(config.muted);
        Self {
            inner: Arc::new(Inner {
                config,
                active: Mutex::new(Vec::new()),
                muted,
                chime,
            }),
        }
    }

    /// Inserts a notification into the active set.
    ///
    /// At the display budget, the oldest non-critical entry is evicted
    /// first; when every entry is critical the budget is exceeded rather
    /// than dropping the new one. Non-critical entries are scheduled for
    /// auto-dismissal.
    pub fn push(&self, notification: Notification) {
        let id = notification.id;
        let priority = notification.priority;
        {
            let mut active = self.inner.active.lock();
            if active.len() >= self.inner.config.max_active {
                // Entries are in creation order, so the first non-critical
                // one is the oldest
                if let Some(index) = active.iter().position(|n| !n.is_critical()) {
                    let evicted = active.remove(index);
                    debug!(id = %evicted.id, "Evicted notification at display budget");
                }
            }
            info!(id = %id, priority = %priority, title = %notification.title, "Notification raised");
            active.push(notification);
        }

        if priority.is_audible() && !self.is_muted() {
            self.inner.chime.play(priority);
        }

        if !priority.is_critical() {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(inner.config.auto_dismiss()).await;
                let mut active = inner.active.lock();
                // Explicit dismissal cancels the auto timer
                if let Some(index) = active.iter().position(|n| n.id == id && !n.dismissed) {
                    active.remove(index);
                    debug!(id = %id, "Notification auto-dismissed");
                }
            });
        }
    }

    /// Dismisses a notification explicitly.
    ///
    /// Marks it dismissed immediately, then removes it after the removal
    /// transition window. Unknown ids are a no-op.
    pub fn dismiss(&self, id: Uuid) {
        {
            let mut active = self.inner.active.lock();
            let Some(notification) = active.iter_mut().find(|n| n.id == id) else {
                return;
            };
            notification.dismissed = true;
        }
        debug!(id = %id, "Notification dismissed");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.config.removal_transition()).await;
            inner.active.lock().retain(|n| n.id != id);
        });
    }

    /// Removes every active notification immediately.
    pub fn clear(&self) {
        self.inner.active.lock().clear();
    }

    /// Returns a snapshot of the active set in creation order.
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        self.inner.active.lock().clone()
    }

    /// Returns the number of active notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.active.lock().len()
    }

    /// Returns true if no notification is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.active.lock().is_empty()
    }

    /// Mutes or unmutes the audible cue.
    pub fn set_muted(&self, muted: bool) {
        self.inner.muted.store(muted, Ordering::Relaxed);
    }

    /// Returns whether the audible cue is muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.inner.muted.load(Ordering::Relaxed)
    }

    /// Subscribes the center to a client's four event categories.
    ///
    /// Keep the returned handles alive for as long as the binding should
    /// exist; pass them to
    /// [`StreamClient::remove_consumer`] to detach.
    pub fn attach(&self, client: &StreamClient) -> Vec<ConsumerHandle> {
        self.attach_dispatcher(client.dispatcher())
    }

    /// Subscribes the center directly to a dispatcher.
    pub fn attach_dispatcher(
        &self,
        dispatcher: &vantage_stream::dispatch::MessageDispatcher,
    ) -> Vec<ConsumerHandle> {
        vantage_core::types::EventCategory::ALL
            .into_iter()
            .map(|category| {
                let center = self.clone();
                dispatcher.on_event(category, move |event| {
                    if let Some(notification) = Notification::from_event(event) {
                        center.push(notification);
                    }
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("active", &self.len())
            .field("muted", &self.is_muted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use vantage_core::types::EventCategory;
    use vantage_stream::dispatch::MessageDispatcher;

    fn note(priority: Priority, title: &str) -> Notification {
        Notification::new(EventCategory::RiskWarning, priority, title, "body")
    }

    struct CountingChime(Mutex<Vec<Priority>>);

    impl Chime for CountingChime {
        fn play(&self, priority: Priority) {
            self.0.lock().push(priority);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_critical_auto_dismisses() {
        let center = NotificationCenter::new(NotifyConfig::default());
        center.push(note(Priority::Medium, "a"));
        assert_eq!(center.len(), 1);

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert!(center.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_survives_auto_dismiss_window() {
        let center = NotificationCenter::new(NotifyConfig::default());
        center.push(note(Priority::Critical, "bot error"));

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(center.len(), 1);
        assert_eq!(center.active()[0].title, "bot error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_evicts_oldest_non_critical() {
        let config = NotifyConfig {
            max_active: 3,
            ..NotifyConfig::default()
        };
        let center = NotificationCenter::new(config);
        center.push(note(Priority::Critical, "keep"));
        center.push(note(Priority::Medium, "evict-me"));
        center.push(note(Priority::Medium, "second"));

        center.push(note(Priority::Low, "third"));

        let titles: Vec<_> = center.active().iter().map(|n| n.title.clone()).collect();
        assert_eq!(titles, vec!["keep", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_never_evicts_critical() {
        let config = NotifyConfig {
            max_active: 2,
            ..NotifyConfig::default()
        };
        let center = NotificationCenter::new(config);
        center.push(note(Priority::Critical, "a"));
        center.push(note(Priority::Critical, "b"));

        // The budget is a display budget, not a drop policy for critical
        center.push(note(Priority::Critical, "c"));
        assert_eq!(center.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_marks_then_removes_after_transition() {
        let center = NotificationCenter::new(NotifyConfig::default());
        center.push(note(Priority::Critical, "a"));
        let id = center.active()[0].id;

        center.dismiss(id);
        assert!(center.active()[0].dismissed);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(center.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_auto_timer() {
        let center = NotificationCenter::new(NotifyConfig::default());
        center.push(note(Priority::Medium, "a"));
        let id = center.active()[0].id;
        center.dismiss(id);

        // Both timers elapse without a double removal or a stale entry
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(center.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_unknown_id_is_noop() {
        let center = NotificationCenter::new(NotifyConfig::default());
        center.push(note(Priority::Critical, "a"));
        center.dismiss(Uuid::new_v4());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(center.len(), 1);
        assert!(!center.active()[0].dismissed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chime_plays_for_audible_priorities_only() {
        let chime = Arc::new(CountingChime(Mutex::new(Vec::new())));
        let center = NotificationCenter::with_chime(NotifyConfig::default(), chime.clone());

        center.push(note(Priority::Low, "a"));
        center.push(note(Priority::Medium, "b"));
        center.push(note(Priority::High, "c"));
        center.push(note(Priority::Critical, "d"));

        assert_eq!(*chime.0.lock(), vec![Priority::High, Priority::Critical]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mute_suppresses_chime() {
        let chime = Arc::new(CountingChime(Mutex::new(Vec::new())));
        let center = NotificationCenter::with_chime(NotifyConfig::default(), chime.clone());
        center.set_muted(true);

        center.push(note(Priority::Critical, "a"));
        assert!(chime.0.lock().is_empty());

        center.set_muted(false);
        center.push(note(Priority::Critical, "b"));
        assert_eq!(chime.0.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatched_events_become_notifications() {
        let dispatcher = MessageDispatcher::new();
        let center = NotificationCenter::new(NotifyConfig::default());
        let _handles = center.attach_dispatcher(&dispatcher);

        dispatcher.dispatch_text(r#"{"type":"signal","symbol":"TSLA","side":"buy"}"#);
        dispatcher.dispatch_text(r#"{"type":"status","status":"running"}"#);
        dispatcher.dispatch_text(r#"{"type":"status","status":"error","message":"halted"}"#);

        let active = center.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].category, EventCategory::NewSignal);
        assert!(active[0].message.contains("Advisory only"));
        assert_eq!(active[1].title, "Bot: error");
        assert_eq!(active[1].priority, Priority::Critical);
    }
}
