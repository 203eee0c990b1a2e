//! Event bus internals and the shared handle services receive.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::event::{Event, EventResult, EventSubscriber, SubscriberFn, SubscriberFuture, SubscriptionId};

/// Wraps a typed callback so it can sit in the same subscriber list as the
/// name-keyed ones; events of any other type pass through untouched.
struct TypedSubscriber<E: Event + 'static> {
    callback: Box<dyn for<'a> Fn(&'a E) -> SubscriberFuture<'a> + Send + Sync>,
}

impl<E: Event + 'static> fmt::Debug for TypedSubscriber<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSubscriber").finish_non_exhaustive()
    }
}

#[async_trait]
impl<E: Event + 'static> EventSubscriber for TypedSubscriber<E> {
    async fn handle(&self, event: &dyn Event) -> EventResult {
        if let Some(concrete) = event.as_any().downcast_ref::<E>() {
            (self.callback)(concrete).await
        } else {
            EventResult::Continue
        }
    }
}

struct NamedSubscriber {
    callback: SubscriberFn,
}

#[async_trait]
impl EventSubscriber for NamedSubscriber {
    async fn handle(&self, event: &dyn Event) -> EventResult {
        (self.callback)(event).await
    }
}

/// Dispatcher state (internal, wrapped by [`EventBus`])
struct Dispatcher {
    by_name: HashMap<&'static str, Vec<(SubscriptionId, Box<dyn EventSubscriber>)>>,
    by_type: HashMap<TypeId, Vec<(SubscriptionId, Box<dyn EventSubscriber>)>>,
    next_id: SubscriptionId,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let named: usize = self.by_name.values().map(Vec::len).sum();
        let typed: usize = self.by_type.values().map(Vec::len).sum();
        f.debug_struct("Dispatcher")
            .field("named_subscribers", &named)
            .field("typed_subscribers", &typed)
            .finish()
    }
}

impl Dispatcher {
    fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            by_type: HashMap::new(),
            next_id: 1,
        }
    }

    fn subscribe(&mut self, event_name: &'static str, callback: SubscriberFn) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.by_name
            .entry(event_name)
            .or_default()
            .push((id, Box::new(NamedSubscriber { callback })));
        id
    }

    fn subscribe_typed<E: Event + 'static>(
        &mut self,
        callback: Box<dyn for<'a> Fn(&'a E) -> SubscriberFuture<'a> + Send + Sync>,
    ) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.by_type
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, Box::new(TypedSubscriber { callback })));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut found = false;
        for subscribers in self.by_name.values_mut().chain(self.by_type.values_mut()) {
            let before = subscribers.len();
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            if subscribers.len() < before {
                found = true;
            }
        }
        found
    }

    async fn publish(&self, event: &dyn Event) -> EventResult {
        if let Some(subscribers) = self.by_name.get(event.name()) {
            for (_, subscriber) in subscribers {
                if subscriber.handle(event).await == EventResult::Stop {
                    return EventResult::Stop;
                }
            }
        }
        if let Some(subscribers) = self.by_type.get(&event.as_any().type_id()) {
            for (_, subscriber) in subscribers {
                if subscriber.handle(event).await == EventResult::Stop {
                    return EventResult::Stop;
                }
            }
        }
        EventResult::Continue
    }
}

/// Shared publish/subscribe handle. Cheap to clone; one instance is created
/// per bootstrap and threaded into every service context.
#[derive(Clone)]
pub struct EventBus {
    dispatcher: Arc<Mutex<Dispatcher>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            dispatcher: Arc::new(Mutex::new(Dispatcher::new())),
        }
    }

    /// Subscribe to events carrying a specific name
    pub async fn subscribe(&self, event_name: &'static str, callback: SubscriberFn) -> SubscriptionId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.subscribe(event_name, callback)
    }

    /// Subscribe to events of a concrete type
    pub async fn subscribe_typed<E: Event + 'static>(
        &self,
        callback: Box<dyn for<'a> Fn(&'a E) -> SubscriberFuture<'a> + Send + Sync>,
    ) -> SubscriptionId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.subscribe_typed::<E>(callback)
    }

    /// Remove a subscription; returns whether it existed
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.unsubscribe(id)
    }

    /// Deliver an event to every matching subscriber in registration order.
    /// A `Stop` result halts propagation to the remaining subscribers.
    pub async fn publish(&self, event: &dyn Event) -> EventResult {
        let dispatcher = self.dispatcher.lock().await;
        dispatcher.publish(event).await
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
