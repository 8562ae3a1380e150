//! NotificationManager implementation
//!
//! Fan-out of typed events to subscribers over unbounded channels. Publishing
//! never blocks and never waits for a subscriber, so it is safe to publish
//! while holding the task manager's lock.

use crate::notifications::error::NotificationError;
use crate::notifications::event::{Event, EventFilter};
use crate::notifications::traits::{Subscriber, SubscriberStatistics};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Receiving end of a subscription
pub type EventReceiver = UnboundedReceiver<Event>;

struct SubscriberInfo {
    filter: EventFilter,
    source: String,
    sender: UnboundedSender<Event>,
    statistics: SubscriberStatistics,
}

#[derive(Default)]
pub struct NotificationManager {
    subscribers: HashMap<String, SubscriberInfo>,
}

impl std::fmt::Debug for NotificationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationManager")
            .field("subscribers", &self.subscribers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    pub fn subscribe(
        &mut self,
        subscriber_id: String,
        filter: EventFilter,
        source: String,
    ) -> EventReceiver {
        let (sender, receiver) = unbounded_channel();

        let subscriber_info = SubscriberInfo {
            filter,
            source: source.clone(),
            sender,
            statistics: SubscriberStatistics::new(),
        };

        // Warn if overwriting existing subscriber
        if let Some(existing) = self.subscribers.insert(subscriber_id.clone(), subscriber_info) {
            log::warn!(
                "Subscriber '{}' replaced existing subscription (source: {} -> {})",
                subscriber_id,
                existing.source,
                source
            );
        }

        receiver
    }

    pub fn unsubscribe(&mut self, subscriber_id: &str) -> Result<(), NotificationError> {
        self.subscribers
            .remove(subscriber_id)
            .map(|_| ())
            .ok_or_else(|| NotificationError::UnknownSubscriber(subscriber_id.to_string()))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers.contains_key(subscriber_id)
    }

    pub fn get_subscriber_statistics(&self, subscriber_id: &str) -> Option<&SubscriberStatistics> {
        self.subscribers.get(subscriber_id).map(|info| &info.statistics)
    }

    /// Deliver `event` to every subscriber whose filter accepts it
    ///
    /// Subscribers whose receiver was dropped are removed and reported in
    /// the returned error; delivery to the others still happens.
    pub fn publish(&mut self, event: Event) -> Result<(), NotificationError> {
        let mut failed_subscribers = Vec::new();

        for (subscriber_id, subscriber_info) in &self.subscribers {
            if !subscriber_info.filter.accepts(&event) {
                subscriber_info.statistics.record_filtered();
                continue;
            }

            if subscriber_info.sender.send(event.clone()).is_err() {
                failed_subscribers.push(subscriber_id.clone());
            } else {
                subscriber_info.statistics.record_delivered();
            }
        }

        for subscriber_id in &failed_subscribers {
            self.subscribers.remove(subscriber_id);
            log::debug!("Removed closed subscriber '{}'", subscriber_id);
        }

        if !failed_subscribers.is_empty() {
            return Err(NotificationError::PublishFailed {
                event_type: event.kind().to_string(),
                failed_subscribers,
            });
        }

        Ok(())
    }
}

/// Drive `subscriber` with every event arriving on `receiver`
///
/// Runs until all senders are gone. Handler errors are logged and do not
/// stop the loop. Returns the number of events handled.
pub async fn forward_events(mut receiver: EventReceiver, subscriber: Arc<dyn Subscriber>) -> usize {
    let mut handled = 0;
    while let Some(event) = receiver.recv().await {
        if let Err(e) = subscriber.handle_event(event).await {
            log::warn!(
                "Subscriber '{}' ({}) failed to handle event: {}",
                subscriber.subscriber_id(),
                subscriber.source(),
                e
            );
        }
        handled += 1;
    }
    log::trace!("Event forwarding for '{}' finished", subscriber.subscriber_id());
    handled
}
