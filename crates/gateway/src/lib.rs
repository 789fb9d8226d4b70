//! Payment gateway adapter.
//!
//! Two responsibilities: minting remote payment intents ("orders" in
//! Razorpay terms) over the gateway REST API, and verifying the HMAC
//! signature the gateway attaches to payment callbacks. Credentials arrive
//! through [`GatewayConfig`], built once at startup from the application
//! configuration; nothing in here reads the environment.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{error, instrument};

type HmacSha256 = Hmac<Sha256>;

/// Gateway credentials and endpoint, carried explicitly.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Public key id, safe to expose to checkout clients.
    pub key_id: String,
    /// Server-held secret: basic-auth password for the REST API and HMAC
    /// key for callback signatures.
    pub key_secret: String,
    /// Base URL of the gateway REST API, e.g. `https://api.razorpay.com/v1`.
    pub api_base: String,
    /// ISO currency code the gateway charges in.
    pub currency: String,
}

/// Errors from the gateway adapter. All of them map to a 5xx at the
/// boundary; the caller may retry with a fresh intent.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// A remote payment-intent object, referenced by an opaque id. Returned to
/// the client verbatim so the checkout widget can open it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Remote payment-intent creation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Mints a gateway order for `amount_minor` (minor units: paise for
    /// INR), keyed by the caller-supplied receipt id.
    async fn create_intent(
        &self,
        amount_minor: i64,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for std::sync::Arc<T> {
    async fn create_intent(
        &self,
        amount_minor: i64,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        (**self).create_intent(amount_minor, receipt).await
    }
}

/// HTTP implementation of [`PaymentGateway`] against the Razorpay-style
/// orders API.
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    error: Option<GatewayErrorDetail>,
}

#[derive(Deserialize)]
struct GatewayErrorDetail {
    description: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self))]
    async fn create_intent(
        &self,
        amount_minor: i64,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let response = self
            .http
            .post(format!("{}/orders", self.config.api_base))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&CreateOrderBody {
                amount: amount_minor,
                currency: &self.config.currency,
                receipt,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<GatewayErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.description)
                .unwrap_or_else(|| "payment gateway processing failed".to_string());
            error!(status = status.as_u16(), %message, "gateway order creation failed");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<GatewayOrder>().await?)
    }
}

/// Computes the signature the gateway is expected to have produced for a
/// completed payment: HMAC-SHA256 over `"{order_id}|{payment_id}"`, hex
/// encoded.
pub fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Exact byte comparison of the supplied signature against the recomputed
/// one. A mismatch means the callback was forged or altered in transit.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, supplied: &str) -> bool {
    expected_signature(secret, order_id, payment_id) == supplied
}
