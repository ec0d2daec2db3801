//! Process-wide publish/subscribe channel.
//!
//! Handlers are delivered on the `MainContext`, one job per publish, in
//! subscription order. A publish only reaches subscribers registered at the
//! time of the call; nothing is buffered for late subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::context::MainContext;

/// Topic carrying every freshly acquired `LocationSample`.
pub const LOCATION_UPDATED: &str = "location.updated";

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    handler: Handler<T>,
    active: Arc<AtomicBool>,
}

type Registry<T> = RwLock<HashMap<String, Vec<Subscriber<T>>>>;

pub struct EventBus<T> {
    context: Arc<MainContext>,
    registry: Arc<Registry<T>>,
    next_id: AtomicU64,
}

impl<T> EventBus<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(context: Arc<MainContext>) -> Self {
        Self {
            context,
            registry: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `handler` for `topic`.
    ///
    /// Delivery stops when the returned `Subscription` is dropped or passed
    /// to `unsubscribe`.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));

        self.registry
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber {
                id,
                handler: Arc::new(handler),
                active: active.clone(),
            });
        tracing::debug!("Subscriber {} registered for '{}'", id, topic);

        let registry: Weak<Registry<T>> = Arc::downgrade(&self.registry);
        let owned_topic = topic.to_string();
        Subscription {
            id,
            topic: topic.to_string(),
            active,
            detach: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    let mut topics = registry.write();
                    if let Some(subscribers) = topics.get_mut(&owned_topic) {
                        subscribers.retain(|s| s.id != id);
                        if subscribers.is_empty() {
                            topics.remove(&owned_topic);
                        }
                    }
                }
            })),
        }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        subscription.cancel();
    }

    /// Deliver `value` to every subscriber of `topic` on the execution context.
    ///
    /// Returns the number of subscribers the value was queued for.
    pub fn publish(&self, topic: &str, value: T) -> usize {
        let targets: Vec<(Handler<T>, Arc<AtomicBool>)> = self
            .registry
            .read()
            .get(topic)
            .map(|subscribers| {
                subscribers
                    .iter()
                    .map(|s| (s.handler.clone(), s.active.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if targets.is_empty() {
            tracing::trace!("No subscribers for '{}'", topic);
            return 0;
        }

        let count = targets.len();
        let queued = self.context.dispatch(move || {
            for (handler, active) in targets {
                // Unsubscribed between publish and delivery
                if active.load(Ordering::Acquire) {
                    handler(&value);
                }
            }
        });

        if queued {
            tracing::debug!("Published '{}' to {} subscriber(s)", topic, count);
            count
        } else {
            0
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry.read().get(topic).map_or(0, Vec::len)
    }
}

/// Live registration on an `EventBus`. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    topic: String,
    active: Arc<AtomicBool>,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop delivery immediately, including publishes already queued.
    pub fn cancel(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(detach) = self.detach.take() {
            detach();
            tracing::debug!("Subscriber {} removed from '{}'", self.id, self.topic);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}
