//! Synchronous in-process event bus
//!
//! Handlers are keyed by event kind and delivered to in registration order.
//! Delivery is fire-and-forget from the publisher's perspective: a failing
//! handler is logged and isolated, it never stops delivery to the remaining
//! handlers and never fails the publishing run.

use crate::events::lifecycle::AssetLifecycleEvent;
use std::sync::Arc;
use tracing::{debug, error};

/// Error returned by an event handler
#[derive(Debug, thiserror::Error)]
#[error("Handler failed: {0}")]
pub struct HandlerError(pub String);

/// Trait for asset lifecycle event subscribers
#[async_trait::async_trait]
pub trait AssetEventHandler: Send + Sync {
    /// Handler name, used in delivery logs
    fn name(&self) -> &str;

    /// Handle a single lifecycle event
    async fn handle(&self, event: &AssetLifecycleEvent) -> Result<(), HandlerError>;
}

/// Outcome of one publish call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivery {
    /// Handlers that accepted the event
    pub delivered: usize,
    /// Handlers that returned an error
    pub failed: usize,
}

/// Typed publish/subscribe bus for asset lifecycle events
///
/// Subscriptions are registered at wiring time; the bus is then shared
/// immutably (`Arc<EventBus>`) with publishers.
#[derive(Default)]
pub struct EventBus {
    expired: Vec<Arc<dyn AssetEventHandler>>,
    unexpired: Vec<Arc<dyn AssetEventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for expired events; delivery order follows
    /// registration order
    pub fn subscribe_expired(&mut self, handler: Arc<dyn AssetEventHandler>) {
        self.expired.push(handler);
    }

    /// Register a handler for unexpired events
    pub fn subscribe_unexpired(&mut self, handler: Arc<dyn AssetEventHandler>) {
        self.unexpired.push(handler);
    }

    /// Number of handlers registered for each event kind
    pub fn subscriber_counts(&self) -> (usize, usize) {
        (self.expired.len(), self.unexpired.len())
    }

    /// Deliver the event synchronously to every matching handler
    ///
    /// Handler failures are logged and counted, never propagated.
    pub async fn publish(&self, event: &AssetLifecycleEvent) -> Delivery {
        let handlers = match event {
            AssetLifecycleEvent::Expired(_) => &self.expired,
            AssetLifecycleEvent::Unexpired(_) => &self.unexpired,
        };

        let mut delivery = Delivery::default();

        for handler in handlers {
            match handler.handle(event).await {
                Ok(()) => {
                    delivery.delivered += 1;
                    debug!(
                        handler = handler.name(),
                        asset_id = %event.asset_id(),
                        event_type = event.event_type(),
                        "Delivered lifecycle event"
                    );
                }
                Err(e) => {
                    delivery.failed += 1;
                    error!(
                        handler = handler.name(),
                        asset_id = %event.asset_id(),
                        event_type = event.event_type(),
                        error = %e,
                        "Event handler failed"
                    );
                }
            }
        }

        delivery
    }
}

/// Default subscriber that logs every event it receives
pub struct LoggingHandler;

#[async_trait::async_trait]
impl AssetEventHandler for LoggingHandler {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(&self, event: &AssetLifecycleEvent) -> Result<(), HandlerError> {
        tracing::info!(
            asset_id = %event.asset_id(),
            event_type = event.event_type(),
            correlation_id = %event.correlation_id(),
            "Asset lifecycle transition"
        );
        Ok(())
    }
}
