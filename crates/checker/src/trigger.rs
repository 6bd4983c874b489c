//! Trigger adapter: turns external invocations into checker runs
//!
//! The checker itself provides no mutual exclusion between overlapping
//! runs; the trigger does, with single-flight semantics. A trigger that
//! arrives while a run is in flight is rejected rather than queued, so
//! overlapping scheduled ticks and manual invocations cannot double-publish.

use actix_web::{web, HttpResponse, Responder};
use media_expiry_core::ExpiryError;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::checker::{ExpirationChecker, RunReport};

/// Outcome of an external trigger
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// A run is already in flight
    #[error("A check run is already in progress")]
    Busy,

    /// The run itself failed
    #[error(transparent)]
    Run(#[from] ExpiryError),
}

/// Single-flight trigger around the expiration checker
pub struct CheckTrigger {
    checker: Arc<ExpirationChecker>,
    in_flight: Mutex<()>,
}

impl CheckTrigger {
    pub fn new(checker: Arc<ExpirationChecker>) -> Self {
        Self {
            checker,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one reconciliation pass, rejecting overlapping invocations
    pub async fn trigger(&self) -> Result<RunReport, TriggerError> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            warn!("Rejecting expiration check: previous run still in progress");
            TriggerError::Busy
        })?;

        info!("Running expiration check");
        let report = self.checker.run().await?;
        Ok(report)
    }
}

/// Trigger API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/expiration").route("/check", web::post().to(trigger_check)),
    );
}

#[derive(Serialize)]
struct CheckResponse {
    status: &'static str,
    #[serde(flatten)]
    report: RunReport,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Run one expiration check
///
/// POST /api/v1/expiration/check
async fn trigger_check(trigger: web::Data<Arc<CheckTrigger>>) -> impl Responder {
    match trigger.trigger().await {
        Ok(report) => HttpResponse::Ok().json(CheckResponse {
            status: "completed",
            report,
        }),
        Err(TriggerError::Busy) => HttpResponse::Conflict().json(ErrorResponse {
            error: "Check already in progress".to_string(),
        }),
        Err(TriggerError::Run(e @ ExpiryError::NotValidated))
        | Err(TriggerError::Run(e @ ExpiryError::Configuration { .. })) => {
            error!(error = %e, "Check rejected: service misconfigured");
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: e.to_string(),
            })
        }
        Err(TriggerError::Run(e)) => {
            error!(error = %e, "Expiration check failed");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}
