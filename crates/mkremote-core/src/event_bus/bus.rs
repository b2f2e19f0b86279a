//! Event bus
//!
//! The bus is owned by whoever builds the client and handed to the monitor
//! explicitly; there is no process-wide instance. Events reach two kinds of
//! listener: synchronous handlers, run on the publishing task, and broadcast
//! receivers for async consumers. An optional journal keeps the most recent
//! events for a renderer that attaches late.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.0.simple().to_string();
        write!(f, "sub-{}", &id[..8])
    }
}

/// Which events a handler wants
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Everything
    #[default]
    All,
    /// Only these categories
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if `event` passes the filter
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

/// Bus sizing
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Broadcast buffer per receiver; slower receivers skip ahead
    pub capacity: usize,
    /// Events kept in the journal, 0 disables it
    pub journal_len: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            journal_len: 0,
        }
    }
}

/// Event bus failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventBusError {
    /// Nobody is listening
    #[error("No active subscribers")]
    NoSubscribers,
    /// A receiver fell behind and skipped events
    #[error("Event receiver lagged, {0} events skipped")]
    Lagged(u64),
}

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    handler: Box<dyn Fn(&AppEvent) + Send + Sync>,
}

/// Publish/subscribe hub between the monitor and the presentation layer
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    subscriptions: RwLock<Vec<Subscription>>,
    journal: Mutex<VecDeque<(DateTime<Utc>, AppEvent)>>,
    config: EventBusConfig,
}

impl EventBus {
    /// Bus with default sizing and no journal
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Bus with explicit sizing
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity.max(1));
        Self {
            sender,
            subscriptions: RwLock::new(Vec::new()),
            journal: Mutex::new(VecDeque::with_capacity(config.journal_len)),
            config,
        }
    }

    /// Deliver `event` to handlers and receivers
    ///
    /// Returns how many broadcast receivers got it. `NoSubscribers` means
    /// there was neither a handler nor a receiver.
    pub fn publish(&self, event: AppEvent) -> Result<usize, EventBusError> {
        tracing::trace!(category = %event.category(), "{}", event.description());
        self.record(&event);

        let subscriptions = self.subscriptions.read();
        subscriptions
            .iter()
            .filter(|sub| sub.filter.matches(&event))
            .for_each(|sub| (sub.handler)(&event));

        match self.sender.send(event) {
            Ok(receivers) => Ok(receivers),
            Err(_) if subscriptions.is_empty() => Err(EventBusError::NoSubscribers),
            Err(_) => Ok(0),
        }
    }

    /// Register a synchronous handler
    ///
    /// Handlers run on the publishing task and must not publish themselves.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscriptions.write().push(Subscription {
            id,
            filter,
            handler: Box::new(handler),
        });
        tracing::debug!("Added {}", id);
        id
    }

    /// New broadcast receiver, see [`recv_next`]
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Remove a handler; false if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|sub| sub.id != id);
        let removed = subscriptions.len() != before;
        if removed {
            tracing::debug!("Removed {}", id);
        }
        removed
    }

    /// Number of registered handlers
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Journaled events, oldest first, optionally only those after `since`
    pub fn journal(&self, since: Option<DateTime<Utc>>) -> Vec<AppEvent> {
        self.journal
            .lock()
            .iter()
            .filter(|(at, _)| since.map_or(true, |since| *at > since))
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Forget every journaled event
    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }

    /// Sizing in use
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    fn record(&self, event: &AppEvent) {
        if self.config.journal_len == 0 {
            return;
        }
        let mut journal = self.journal.lock();
        if journal.len() == self.config.journal_len {
            journal.pop_front();
        }
        journal.push_back((Utc::now(), event.clone()));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.subscriber_count())
            .field("receivers", &self.sender.receiver_count())
            .field("config", &self.config)
            .finish()
    }
}

/// Receive the next event, skipping over lag notifications
///
/// Returns `None` once the bus is dropped.
pub async fn recv_next(receiver: &mut broadcast::Receiver<AppEvent>) -> Option<AppEvent> {
    loop {
        match receiver.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("{}", EventBusError::Lagged(skipped));
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
