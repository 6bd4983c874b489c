//! Expiry Service - Asset Expiration Reconciliation
//!
//! Validates the named queries at startup, then serves the check trigger
//! over HTTP and (optionally) on a background interval.

use actix_web::{web, App, HttpResponse, HttpServer};
use media_expiry_core::{
    load_dotenv, CheckerConfig, ConfigLoader, DatabaseConfig, DatabasePool, EventBus,
    LoggingHandler, ServiceConfig,
};
use media_expiry_checker::checker::ExpirationChecker;
use media_expiry_checker::scheduler::run_check_task;
use media_expiry_checker::store::PostgresAssetStore;
use media_expiry_checker::trigger::{self, CheckTrigger};
use std::sync::Arc;
use tracing::{error, info};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // The service config carries the log level, so it loads before the
    // subscriber; a failure here surfaces through the returned error.
    let service_config = load_config::<ServiceConfig>("service")?;

    // RUST_LOG takes precedence and accepts full filter directives
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&service_config.log_level)
            }),
        )
        .json()
        .init();

    let database_config = load_config::<DatabaseConfig>("database")?;
    let checker_config = load_config::<CheckerConfig>("checker")?;

    let pool = DatabasePool::new(&database_config)
        .await
        .map_err(|e| fatal(format!("Failed to connect to database: {}", e)))?;

    let store = Arc::new(PostgresAssetStore::new(pool.pool().clone()));
    store
        .initialize_schema()
        .await
        .map_err(|e| fatal(format!("Failed to initialize schema: {}", e)))?;

    let mut bus = EventBus::new();
    bus.subscribe_expired(Arc::new(LoggingHandler));
    bus.subscribe_unexpired(Arc::new(LoggingHandler));

    let checker = Arc::new(ExpirationChecker::new(
        store,
        Arc::new(bus),
        checker_config.clone(),
    ));

    // Fail fast: the service must not accept triggers with unresolvable
    // queries.
    checker
        .validate()
        .await
        .map_err(|e| fatal(format!("Startup validation failed: {}", e)))?;

    let check_trigger = Arc::new(CheckTrigger::new(checker));

    if checker_config.check_interval_seconds > 0 {
        let scheduled = check_trigger.clone();
        tokio::spawn(run_check_task(
            scheduled,
            checker_config.check_interval_seconds,
        ));
    } else {
        info!("Scheduler disabled; checks are trigger-only");
    }

    info!(
        host = %service_config.host,
        port = service_config.port,
        "Starting Expiry Service"
    );

    let pool_data = web::Data::new(pool);
    let trigger_data = web::Data::new(check_trigger);

    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(trigger_data.clone())
            .configure(trigger::configure_routes)
            .route("/health", web::get().to(health_check))
    })
    .workers(service_config.workers)
    .bind((service_config.host.as_str(), service_config.port))?
    .run()
    .await?;

    Ok(())
}

fn load_config<C: ConfigLoader>(name: &str) -> std::io::Result<C> {
    let config = C::from_env().map_err(|e| fatal(format!("Invalid {} config: {}", name, e)))?;
    config
        .validate()
        .map_err(|e| fatal(format!("Invalid {} config: {}", name, e)))?;
    Ok(config)
}

fn fatal(message: String) -> std::io::Error {
    error!("{}", message);
    std::io::Error::other(message)
}

async fn health_check(pool: web::Data<DatabasePool>) -> HttpResponse {
    let healthy = pool.is_healthy().await;
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "service": "expiry-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
