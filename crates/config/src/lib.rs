use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// `AppConfig` holds every configuration parameter the application needs.
///
/// Loaded once at process start from environment variables (optionally via a
/// `.env` file), then passed by reference into the components that need it.
/// Business logic never reads the environment directly; in particular the
/// payment-gateway secret reaches the signature check only through this
/// struct.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    // --- Database settings ---
    /// Database hostname or service name.
    pub db_host: String,
    /// Database port (default: 5432).
    pub db_port: u16,
    /// Database user.
    pub db_user: String,
    /// Database password.
    pub db_password: String,
    /// Database name.
    pub db_name: String,

    // --- HTTP server ---
    /// The port on which the HTTP server will listen.
    pub http_port: u16,

    // --- Shutdown timeout ---
    /// Graceful shutdown timeout (human-friendly format, e.g. "5s", "1m").
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub shutdown_timeout: Duration,

    // --- Payment gateway ---
    /// Public key id, safe to hand to clients for checkout widgets.
    pub gateway_key_id: String,
    /// Server-held secret used for intent creation auth and callback HMAC.
    pub gateway_key_secret: String,
    /// Base URL of the gateway REST API.
    pub gateway_api_base: String,
    /// ISO currency code charged by the gateway.
    pub gateway_currency: String,

    // --- Listing search ---
    /// Fixed page size of the listing search endpoint.
    pub results_per_page: u32,
}

/// Custom deserializer for graceful shutdown timeout.
/// Accepts human-readable formats like "5s", "1m", etc.
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let val = String::deserialize(deserializer)?;
    humantime::parse_duration(&val)
        .map_err(|e| D::Error::custom(format!("Invalid duration '{val}': {e}")))
}

impl AppConfig {
    /// Loads configuration from environment variables (and optionally from a
    /// `.env` file). Fields not set via env fall back to local-development
    /// defaults.
    ///
    /// # Errors
    /// Returns an error if environment variables are invalid or missing
    /// required values.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            // Database
            .set_default("db_host", "localhost")?
            .set_default("db_port", 5432)?
            .set_default("db_user", "bookings_user")?
            .set_default("db_password", "securepassword")?
            .set_default("db_name", "bookings_db")?
            // HTTP
            .set_default("http_port", 8081)?
            // Shutdown
            .set_default("shutdown_timeout", "5s")?
            // Payment gateway (test-mode defaults, overridden in deployment)
            .set_default("gateway_key_id", "rzp_test_key")?
            .set_default("gateway_key_secret", "rzp_test_secret")?
            .set_default("gateway_api_base", "https://api.razorpay.com/v1")?
            .set_default("gateway_currency", "INR")?
            // Search
            .set_default("results_per_page", 4)?
            .add_source(config::Environment::default().separator("_"))
            .build()?;

        settings
            .try_deserialize()
            .context("Failed to load configuration")
    }
}
