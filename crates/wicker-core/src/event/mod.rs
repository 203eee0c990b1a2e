//! Process-wide publish/subscribe channel.
//!
//! One bus exists per bootstrap, handed to every service context. Services
//! subscribe by event name or by concrete event type; publishers dispatch to
//! every matching subscriber in registration order.

pub mod bus;
pub mod types;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

/// Type for subscription identifiers
pub type SubscriptionId = u64;

/// Result of event processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue delivering to remaining subscribers
    Continue,
    /// Stop propagation to remaining subscribers
    Stop,
}

/// Core event trait
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Stable name of this event
    fn name(&self) -> &'static str;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Future returned by an event subscriber
pub type SubscriberFuture<'a> = Pin<Box<dyn Future<Output = EventResult> + Send + 'a>>;

/// Boxed subscriber callback
pub type SubscriberFn = Box<dyn for<'a> Fn(&'a dyn Event) -> SubscriberFuture<'a> + Send + Sync>;

/// Asynchronous event subscriber trait
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    async fn handle(&self, event: &dyn Event) -> EventResult;
}

/// Adapter for synchronous subscriber functions
pub fn sync_subscriber<F>(f: F) -> SubscriberFn
where
    F: Fn(&dyn Event) -> EventResult + Send + Sync + 'static,
{
    Box::new(move |event| {
        let result = f(event);
        Box::pin(async move { result })
    })
}

/// Adapter for synchronous subscribers of a concrete event type
pub fn sync_typed_subscriber<E, F>(f: F) -> Box<dyn for<'a> Fn(&'a E) -> SubscriberFuture<'a> + Send + Sync>
where
    E: Event + 'static,
    F: Fn(&E) -> EventResult + Send + Sync + 'static,
{
    Box::new(move |event| {
        let result = f(event);
        Box::pin(async move { result })
    })
}

// Re-export important types
pub use bus::EventBus;
pub use types::{ApplicationReadyEvent, ShutdownRequestedEvent};
