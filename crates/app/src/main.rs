/// Property Booking Backend Application
///
/// Main entry point for the property booking backend service. The
/// application provides REST API endpoints for the listing catalogue,
/// booking lifecycle and payment reconciliation.
///
/// # Architecture
///
/// The application follows a modular architecture with:
/// - Repository layer for data access
/// - Service layer for business logic and lifecycle invariants
/// - Gateway layer for the external payment provider
/// - API layer for HTTP endpoints
/// - Metrics for monitoring
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use app_config::AppConfig;
use gateway::{GatewayConfig, HttpPaymentGateway};
use repository::{PgBookingsRepository, PgListingsRepository};
use server::Server;
use service::{BookingLifecycleService, BookingService, ListingCatalogService, ListingService};

/// Initialize the tracing subscriber for logging
fn init_logger() -> Result<()> {
    tracing_subscriber::fmt::init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = init_logger() {
        eprintln!("Failed to initialize logger: {}", err);
        return Err(anyhow::anyhow!("Failed to initialize logger"));
    }

    info!("Property Booking Backend starting...");

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db_pool = match db::init_db_pool(&config).await {
        Ok(pool) => {
            info!("Database initialized successfully");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            error!("Database connection is required for application to function properly");
            return Err(anyhow::anyhow!("Failed to initialize database"));
        }
    };

    let bookings_repo = Arc::new(PgBookingsRepository::new(db_pool.clone()));
    let listings_repo = Arc::new(PgListingsRepository::new(db_pool.clone()));

    let gateway_config = GatewayConfig {
        key_id: config.gateway_key_id.clone(),
        key_secret: config.gateway_key_secret.clone(),
        api_base: config.gateway_api_base.clone(),
        currency: config.gateway_currency.clone(),
    };
    let payment_gateway = HttpPaymentGateway::new(gateway_config.clone());

    let booking_service: Arc<dyn BookingService> = Arc::new(BookingLifecycleService::new(
        bookings_repo,
        listings_repo.clone(),
        payment_gateway,
        gateway_config,
    ));
    let listing_service: Arc<dyn ListingService> = Arc::new(ListingCatalogService::new(
        listings_repo,
        config.results_per_page,
    ));

    let http_server = Server::new(
        config.http_port,
        booking_service,
        listing_service,
        config.gateway_key_id.clone(),
    );
    http_server.start().await?;

    info!("Application stopped");
    Ok(())
}
