//! Change notification: a single-topic publish/subscribe channel.
//!
//! Handlers run synchronously on the publishing thread, after the engine
//! has committed the new state and released its locks. A handler may
//! subscribe or unsubscribe while being called.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Events published by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I18nEvent {
    /// Payload: the new language id.
    LanguageChanged,
}

impl I18nEvent {
    pub fn name(self) -> &'static str {
        match self {
            I18nEvent::LanguageChanged => "language-changed",
        }
    }
}

type Handler = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// A list of handlers for one topic.
#[derive(Default)]
pub struct Topic {
    inner: Arc<Mutex<Subscribers>>,
}

fn lock(inner: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Topic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut subs = lock(&self.inner);
        subs.next_id += 1;
        let id = subs.next_id;
        subs.handlers.push((id, Arc::new(handler)));

        Subscription {
            id,
            topic: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `payload` to every handler subscribed at the time of the call.
    pub fn publish(&self, payload: &str) {
        let handlers: Vec<Handler> = lock(&self.inner)
            .handlers
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        for handler in handlers {
            handler(payload);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).handlers.len()
    }
}

/// Handle returned by `on`; call [`Subscription::off`] to stop receiving events.
///
/// Dropping the handle keeps the handler subscribed.
pub struct Subscription {
    id: u64,
    topic: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    pub fn off(self) {
        if let Some(inner) = self.topic.upgrade() {
            lock(&inner).handlers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |payload: &str| sink.lock().unwrap().push(payload.to_string()))
    }

    // ==================== Publish Tests ====================

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let topic = Topic::new();
        let (a, handler_a) = recorder();
        let (b, handler_b) = recorder();
        let _sub_a = topic.subscribe(handler_a);
        let _sub_b = topic.subscribe(handler_b);

        topic.publish("jp");

        assert_eq!(*a.lock().unwrap(), vec!["jp"]);
        assert_eq!(*b.lock().unwrap(), vec!["jp"]);
    }

    #[test]
    fn test_off_stops_delivery() {
        let topic = Topic::new();
        let (seen, handler) = recorder();
        let sub = topic.subscribe(handler);

        topic.publish("en");
        sub.off();
        topic.publish("zh");

        assert_eq!(*seen.lock().unwrap(), vec!["en"]);
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_keeps_subscription() {
        let topic = Topic::new();
        let (seen, handler) = recorder();
        drop(topic.subscribe(handler));

        topic.publish("en");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_off_after_topic_dropped_is_noop() {
        let topic = Topic::new();
        let sub = topic.subscribe(|_| {});
        drop(topic);
        sub.off();
    }

    #[test]
    fn test_handler_may_subscribe_during_publish() {
        let topic = Arc::new(Topic::new());
        let inner = topic.clone();
        let _sub = topic.subscribe(move |_| {
            let _ = inner.subscribe(|_| {});
        });

        topic.publish("en");
        assert_eq!(topic.subscriber_count(), 2);
    }

    #[test]
    fn test_event_name() {
        assert_eq!(I18nEvent::LanguageChanged.name(), "language-changed");
    }
}
