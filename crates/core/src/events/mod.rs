//! Asset lifecycle events and the in-process event bus
//!
//! The checker reports lifecycle transitions by publishing one event per
//! asset to a synchronous bus; caches, delivery layers, and indexes react by
//! subscribing handlers rather than polling the store themselves.

pub mod bus;
pub mod lifecycle;

pub use bus::{AssetEventHandler, Delivery, EventBus, HandlerError, LoggingHandler};
pub use lifecycle::{AssetExpiredEvent, AssetLifecycleEvent, AssetUnexpiredEvent};
