//! The expiration checker
//!
//! One `run()` is a complete reconciliation pass: select the assets whose
//! expiration just became observable, publish one expired event each, then
//! do the same for assets that returned to a valid state. Both selections
//! and all publications share a single store transaction.
//!
//! `validate()` must be called once before the first run; the composing
//! application owns that ordering, and the checker fails fast with a
//! distinct error when it is violated.

use chrono::{DateTime, Utc};
use media_expiry_core::{
    Asset, AssetExpiredEvent, AssetLifecycleEvent, AssetUnexpiredEvent, CheckerConfig, EventBus,
    ExpiryError, InvariantPolicy,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::store::{AssetSession, AssetStore, EXPIRING_ASSETS, UNEXPIRING_ASSETS};

/// Which transition class a checker phase handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionClass {
    Expired,
    Unexpired,
}

impl TransitionClass {
    fn query(&self) -> &'static str {
        match self {
            TransitionClass::Expired => EXPIRING_ASSETS,
            TransitionClass::Unexpired => UNEXPIRING_ASSETS,
        }
    }

    fn satisfied_by(&self, asset: &Asset, now: DateTime<Utc>) -> bool {
        match self {
            TransitionClass::Expired => asset.is_expiring(now),
            TransitionClass::Unexpired => asset.is_unexpiring(now),
        }
    }

    fn event_for(&self, asset: &Asset) -> AssetLifecycleEvent {
        match self {
            TransitionClass::Expired => {
                AssetLifecycleEvent::Expired(AssetExpiredEvent::new(asset))
            }
            TransitionClass::Unexpired => {
                AssetLifecycleEvent::Unexpired(AssetUnexpiredEvent::new(asset))
            }
        }
    }
}

/// Counts from one completed reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Expired events published
    pub expired: usize,
    /// Unexpired events published
    pub unexpired: usize,
    /// Assets that failed their predicate check and were skipped
    /// (always zero under the abort policy)
    pub invariant_violations: usize,
}

/// Reconciliation service for time-bound assets
///
/// Holds no per-asset state across runs: which assets were already notified
/// is encoded entirely in the store's selection predicates.
pub struct ExpirationChecker {
    store: Arc<dyn AssetStore>,
    bus: Arc<EventBus>,
    config: CheckerConfig,
    validated: AtomicBool,
}

impl ExpirationChecker {
    pub fn new(store: Arc<dyn AssetStore>, bus: Arc<EventBus>, config: CheckerConfig) -> Self {
        Self {
            store,
            bus,
            config,
            validated: AtomicBool::new(false),
        }
    }

    /// Fail fast if the store cannot resolve the named queries
    ///
    /// Must be invoked once, successfully, before the first `run()`; a
    /// failure here is fatal and the service must not start accepting
    /// triggers.
    pub async fn validate(&self) -> Result<(), ExpiryError> {
        for query in [EXPIRING_ASSETS, UNEXPIRING_ASSETS] {
            debug!(query = query, "Checking for presence of named query");
            self.store.resolve(query).await?;
        }

        self.validated.store(true, Ordering::SeqCst);
        info!("Named queries validated");
        Ok(())
    }

    /// Perform one complete reconciliation pass
    ///
    /// Both selections and all event publications execute inside one store
    /// transaction, committed on success and rolled back on failure, and
    /// share one clock captured at the start of the run. Events delivered
    /// before a failure cannot be retracted; the run still reports failure.
    pub async fn run(&self) -> Result<RunReport, ExpiryError> {
        if !self.validated.load(Ordering::SeqCst) {
            return Err(ExpiryError::NotValidated);
        }

        let now = Utc::now();
        let mut session = self.store.begin().await?;

        let outcome = self.run_in_session(session.as_mut(), now).await;

        match outcome {
            Ok(report) => {
                session.commit().await?;
                info!(
                    expired = report.expired,
                    unexpired = report.unexpired,
                    invariant_violations = report.invariant_violations,
                    "Completed expiration check"
                );
                Ok(report)
            }
            Err(e) => {
                // Rollback failures are secondary to the run error
                if let Err(rollback_err) = session.rollback().await {
                    error!(error = %rollback_err, "Rollback failed after run error");
                }
                Err(e)
            }
        }
    }

    async fn run_in_session(
        &self,
        session: &mut dyn AssetSession,
        now: DateTime<Utc>,
    ) -> Result<RunReport, ExpiryError> {
        let mut report = RunReport::default();

        let expired = self
            .check_class(session, TransitionClass::Expired, now)
            .await?;
        report.expired = expired.published;
        report.invariant_violations += expired.violations;

        let unexpired = self
            .check_class(session, TransitionClass::Unexpired, now)
            .await?;
        report.unexpired = unexpired.published;
        report.invariant_violations += unexpired.violations;

        Ok(report)
    }

    /// Select, verify, and publish for one transition class
    async fn check_class(
        &self,
        session: &mut dyn AssetSession,
        class: TransitionClass,
        now: DateTime<Utc>,
    ) -> Result<PhaseStats, ExpiryError> {
        let query = class.query();
        let assets = session.list(query, now).await?;

        info!(count = assets.len(), query = query, "Found transitioning assets");

        let mut stats = PhaseStats::default();

        for asset in &assets {
            if !class.satisfied_by(asset, now) {
                error!(
                    asset_id = %asset.id,
                    query = query,
                    expires_at = ?asset.expires_at,
                    expired = asset.expired,
                    policy = self.config.invariant_policy.as_str(),
                    "Selected asset does not satisfy its predicate"
                );

                match self.config.invariant_policy {
                    InvariantPolicy::Abort => {
                        return Err(ExpiryError::InvariantViolation {
                            query: query.to_string(),
                            asset_id: asset.id,
                            detail: "does not satisfy the selection predicate".to_string(),
                        });
                    }
                    InvariantPolicy::Skip => {
                        stats.violations += 1;
                        continue;
                    }
                }
            }

            let event = class.event_for(asset);
            let delivery = self.bus.publish(&event).await;
            stats.published += 1;

            if delivery.failed > 0 {
                debug!(
                    asset_id = %asset.id,
                    failed_handlers = delivery.failed,
                    "Event delivered with handler failures"
                );
            }
        }

        Ok(stats)
    }
}

#[derive(Debug, Default)]
struct PhaseStats {
    published: usize,
    violations: usize,
}
