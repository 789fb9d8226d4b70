//! HTTP server: routing, identity extraction, metrics and graceful
//! shutdown over the booking and listing services.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use service::{BookingService, ListingService};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

pub mod auth;
pub mod error;
pub mod routes;

/// HTTP server over the booking and listing services.
pub struct Server {
    state: AppState,
    port: u16,
}

/// Collects and exposes HTTP server metrics.
struct Metrics {
    registry: Registry,
    http_requests_total: CounterVec,
    http_request_duration_seconds: HistogramVec,
    errors_total: CounterVec,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "endpoint", "status"],
        )
        .expect("Failed to create http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "endpoint"],
        )
        .expect("Failed to create http_request_duration_seconds metric");

        let errors_total = CounterVec::new(
            Opts::new("errors_total", "Total number of errors"),
            &["source", "endpoint"],
        )
        .expect("Failed to create errors_total metric");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("Failed to register http_requests_total metric");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("Failed to register http_request_duration_seconds metric");
        registry
            .register(Box::new(errors_total.clone()))
            .expect("Failed to register errors_total metric");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            errors_total,
        }
    }

    fn record_request(&self, method: &str, endpoint: &str, status: u16, duration: Duration) {
        self.http_requests_total
            .with_label_values(&[method, endpoint, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration.as_secs_f64());
    }

    fn record_error(&self, source: &str, endpoint: &str) {
        self.errors_total
            .with_label_values(&[source, endpoint])
            .inc();
    }
}

/// Application state shared between request handlers.
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingService>,
    pub listings: Arc<dyn ListingService>,
    /// Public checkout key id, exposed to clients via `/payment/key`.
    pub gateway_key_id: String,
    metrics: Arc<Metrics>,
}

impl Server {
    /// Creates a new Server instance over already-wired services.
    pub fn new(
        port: u16,
        bookings: Arc<dyn BookingService>,
        listings: Arc<dyn ListingService>,
        gateway_key_id: String,
    ) -> Self {
        info!("Initializing HTTP server on port {}", port);

        Self {
            state: AppState {
                bookings,
                listings,
                gateway_key_id,
                metrics: Arc::new(Metrics::new()),
            },
            port,
        }
    }

    /// Starts the server and blocks until it is shut down.
    pub async fn start(&self) -> Result<()> {
        let app = self.create_router();

        let listener = TcpListener::bind(format!("0.0.0.0:{}", self.port))
            .await
            .context("Failed to bind to port")?;

        info!("HTTP server listening on port {}", self.port);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("HTTP server shut down gracefully");
        Ok(())
    }

    fn create_router(&self) -> Router {
        let metrics = self.state.metrics.clone();

        Router::new()
            .route("/api/v1/properties", get(routes::listings::search))
            .route(
                "/api/v1/properties/new",
                post(routes::listings::create_listing),
            )
            .route(
                "/api/v1/properties/{id}",
                get(routes::listings::get_listing)
                    .put(routes::listings::update_listing)
                    .delete(routes::listings::delete_listing),
            )
            .route("/api/v1/review", put(routes::listings::submit_review))
            .route(
                "/api/v1/reviews",
                get(routes::listings::get_reviews).delete(routes::listings::delete_review),
            )
            .route("/api/v1/bookings/new", post(routes::bookings::create_booking))
            .route("/api/v1/bookings/me", get(routes::bookings::my_bookings))
            .route("/api/v1/bookings/{id}", get(routes::bookings::get_booking))
            .route(
                "/api/v1/payment/process",
                post(routes::bookings::process_payment),
            )
            .route("/api/v1/payment/key", get(routes::bookings::payment_key))
            .route(
                "/api/v1/payment/verify",
                post(routes::bookings::verify_payment),
            )
            .route(
                "/api/v1/admin/bookings",
                get(routes::bookings::admin_bookings),
            )
            .route(
                "/api/v1/admin/bookings/{id}",
                put(routes::bookings::update_booking_status)
                    .delete(routes::bookings::delete_booking),
            )
            .route(
                "/api/v1/admin/properties",
                get(routes::listings::admin_listings),
            )
            .route("/health", get(handle_health))
            .route("/metrics", get(handle_metrics))
            .layer(axum::middleware::from_fn_with_state(
                metrics,
                metrics_middleware,
            ))
            .with_state(self.state.clone())
    }
}

/// Middleware for collecting metrics on HTTP requests.
async fn metrics_middleware(
    State(metrics): State<Arc<Metrics>>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    metrics.record_request(&method, &path, status, start.elapsed());
    if status >= 400 {
        metrics.record_error("http", &path);
    }

    response
}

async fn handle_health() -> &'static str {
    "OK"
}

async fn handle_metrics(State(state): State<AppState>) -> Response {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&state.metrics.registry.gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
    }

    match String::from_utf8(buffer) {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to convert metrics to UTF-8: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid metrics data").into_response()
        }
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
