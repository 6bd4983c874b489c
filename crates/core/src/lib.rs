//! # Media Expiry Core
//!
//! Shared building blocks for the asset expiration reconciliation service.
//!
//! This crate provides the asset model and its lifecycle predicates, the
//! error taxonomy, configuration loading, the shared PostgreSQL pool, and
//! the in-process event bus the checker publishes to.
//!
//! ## Modules
//!
//! - `model`: Asset entity and the expiring/unexpiring predicates
//! - `error`: Error types and handling
//! - `config`: Configuration loading and validation
//! - `database`: Shared PostgreSQL connection pool
//! - `events`: Lifecycle events and the synchronous event bus

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod model;

// Re-export commonly used types
pub use config::{
    load_dotenv, CheckerConfig, ConfigLoader, DatabaseConfig, InvariantPolicy, ServiceConfig,
};
pub use database::DatabasePool;
pub use error::ExpiryError;
pub use events::{
    AssetEventHandler, AssetExpiredEvent, AssetLifecycleEvent, AssetUnexpiredEvent, Delivery,
    EventBus, HandlerError, LoggingHandler,
};
pub use model::Asset;

/// Result type alias for media expiry operations
pub type Result<T> = std::result::Result<T, ExpiryError>;
