//! Traits for the notification system

use crate::notifications::event::Event;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Instant;

/// Delivery statistics tracked per subscriber
pub struct SubscriberStatistics {
    events_delivered: AtomicUsize,
    events_filtered: AtomicUsize,
    last_event_time: RwLock<Option<Instant>>,
}

impl Default for SubscriberStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberStatistics {
    pub fn new() -> Self {
        Self {
            events_delivered: AtomicUsize::new(0),
            events_filtered: AtomicUsize::new(0),
            last_event_time: RwLock::new(None),
        }
    }

    pub fn events_delivered(&self) -> usize {
        self.events_delivered.load(Ordering::Relaxed)
    }

    pub fn record_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut time) = self.last_event_time.write() {
            *time = Some(Instant::now());
        }
    }

    pub fn events_filtered(&self) -> usize {
        self.events_filtered.load(Ordering::Relaxed)
    }

    pub fn record_filtered(&self) {
        self.events_filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_event_time(&self) -> Option<Instant> {
        *self.last_event_time.read().ok()?
    }
}

/// Observer that reacts to published events
///
/// Implementations are driven by [`forward_events`](crate::notifications::manager::forward_events),
/// which drains a subscription channel into `handle_event`.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Handle an incoming event
    async fn handle_event(&self, event: Event) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Get the unique identifier for this subscriber
    fn subscriber_id(&self) -> &str;

    /// Get the source identifier for debugging
    fn source(&self) -> &str;
}
