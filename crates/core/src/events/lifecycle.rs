//! Lifecycle event payloads

use crate::model::Asset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event fired when an asset's expiration first becomes observable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetExpiredEvent {
    /// Type of event, always "asset.expired"
    pub event_type: String,

    /// Identity of the asset that expired
    pub asset_id: Uuid,

    /// Asset title at the time of the check
    pub title: String,

    /// The end-of-validity boundary that was crossed
    pub expires_at: Option<DateTime<Utc>>,

    /// Timestamp of the notification
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for tracing
    pub correlation_id: Uuid,
}

impl AssetExpiredEvent {
    /// Create a new expired event referencing the given asset
    pub fn new(asset: &Asset) -> Self {
        Self {
            event_type: "asset.expired".to_string(),
            asset_id: asset.id,
            title: asset.title.clone(),
            expires_at: asset.expires_at,
            timestamp: Utc::now(),
            correlation_id: Uuid::new_v4(),
        }
    }
}

/// Event fired when an asset returns to a valid state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetUnexpiredEvent {
    /// Type of event, always "asset.unexpired"
    pub event_type: String,

    /// Identity of the asset that became valid again
    pub asset_id: Uuid,

    /// Asset title at the time of the check
    pub title: String,

    /// The new end-of-validity boundary, if any
    pub expires_at: Option<DateTime<Utc>>,

    /// Timestamp of the notification
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for tracing
    pub correlation_id: Uuid,
}

impl AssetUnexpiredEvent {
    /// Create a new unexpired event referencing the given asset
    pub fn new(asset: &Asset) -> Self {
        Self {
            event_type: "asset.unexpired".to_string(),
            asset_id: asset.id,
            title: asset.title.clone(),
            expires_at: asset.expires_at,
            timestamp: Utc::now(),
            correlation_id: Uuid::new_v4(),
        }
    }
}

/// Event payload enum for type-safe publishing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetLifecycleEvent {
    Expired(AssetExpiredEvent),
    Unexpired(AssetUnexpiredEvent),
}

impl AssetLifecycleEvent {
    /// Gets the asset ID from the event
    pub fn asset_id(&self) -> Uuid {
        match self {
            AssetLifecycleEvent::Expired(e) => e.asset_id,
            AssetLifecycleEvent::Unexpired(e) => e.asset_id,
        }
    }

    /// Gets the event type string
    pub fn event_type(&self) -> &str {
        match self {
            AssetLifecycleEvent::Expired(e) => &e.event_type,
            AssetLifecycleEvent::Unexpired(e) => &e.event_type,
        }
    }

    /// Gets the correlation ID for tracing
    pub fn correlation_id(&self) -> Uuid {
        match self {
            AssetLifecycleEvent::Expired(e) => e.correlation_id,
            AssetLifecycleEvent::Unexpired(e) => e.correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> Asset {
        Asset {
            id: Uuid::new_v4(),
            title: "Test Movie".to_string(),
            expires_at: Some(Utc::now()),
            expired: false,
        }
    }

    #[test]
    fn test_expired_event_references_asset() {
        let a = asset();
        let event = AssetExpiredEvent::new(&a);

        assert_eq!(event.event_type, "asset.expired");
        assert_eq!(event.asset_id, a.id);
        assert_eq!(event.title, a.title);
        assert!(event.correlation_id != Uuid::nil());
    }

    #[test]
    fn test_lifecycle_event_accessors() {
        let a = asset();
        let event = AssetLifecycleEvent::Unexpired(AssetUnexpiredEvent::new(&a));

        assert_eq!(event.asset_id(), a.id);
        assert_eq!(event.event_type(), "asset.unexpired");
    }

    #[test]
    fn test_event_serialization() {
        let a = asset();
        let event = AssetLifecycleEvent::Expired(AssetExpiredEvent::new(&a));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: AssetLifecycleEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.asset_id(), event.asset_id());
        assert_eq!(deserialized.event_type(), "asset.expired");
    }
}
