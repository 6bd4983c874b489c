//! Asset entity and lifecycle predicates
//!
//! An asset is a time-bound entity: its validity is determined by comparing
//! the stored `expires_at` boundary against the current clock. The `expired`
//! flag records whether downstream consumers have already observed the
//! expiration; the selection queries use it to keep the two transition
//! classes disjoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A time-bound media asset as selected by the named queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Asset {
    /// Store-assigned identity
    pub id: Uuid,

    /// Display title, carried on events for log readability
    pub title: String,

    /// End-of-validity boundary; `None` means the asset never expires
    pub expires_at: Option<DateTime<Utc>>,

    /// Whether the expiration has already been observed downstream
    pub expired: bool,
}

impl Asset {
    /// True when the asset has passed its end-of-validity boundary but has
    /// not yet been reported as expired
    pub fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        !self.expired && self.expires_at.is_some_and(|at| at <= now)
    }

    /// True when the asset was reported expired but is valid again, either
    /// because the boundary was cleared or pushed into the future
    pub fn is_unexpiring(&self, now: DateTime<Utc>) -> bool {
        self.expired && self.expires_at.map_or(true, |at| at > now)
    }
}
