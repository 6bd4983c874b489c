//! # Media Expiry Checker
//!
//! Periodic reconciliation of time-bound assets: selects assets whose
//! computed lifecycle state (expired / unexpired) just became observable and
//! publishes exactly one event per asset per transition, so downstream
//! subsystems can react without polling the store.
//!
//! ## Modules
//!
//! - `store`: named-query asset store, Postgres and in-memory implementations
//! - `checker`: the expiration checker (`validate` / `run`)
//! - `trigger`: single-flight trigger adapter and HTTP routes
//! - `scheduler`: background interval task driving the trigger

pub mod checker;
pub mod scheduler;
pub mod store;
pub mod trigger;

pub use checker::{ExpirationChecker, RunReport};
pub use store::{
    AssetSession, AssetStore, InMemoryAssetStore, PostgresAssetStore, EXPIRING_ASSETS,
    UNEXPIRING_ASSETS,
};
pub use trigger::{CheckTrigger, TriggerError};
