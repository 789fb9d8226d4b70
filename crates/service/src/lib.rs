//! Business logic layer: the booking lifecycle state machine, the listing
//! catalogue, and the access policy gating both.
//!
//! Services are generic over the repository and gateway traits, so the
//! state-machine invariants are tested against in-memory implementations
//! without a database.

use gateway::GatewayError;
use model::PaymentStatus;
use repository::RepositoryError;
use thiserror::Error;

pub mod booking;
pub mod listing;
pub mod policy;

#[cfg(test)]
pub(crate) mod memory;

pub use booking::{BookingLedger, BookingLifecycleService, BookingService};
pub use listing::{ListingCatalogService, ListingService, SearchResults};
pub use policy::{Actor, authorize};

/// The error taxonomy of every service operation. The HTTP boundary maps
/// these onto status codes; nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input; the client can fix and resubmit.
    #[error("{0}")]
    Validation(String),
    /// Authenticated but not permitted to perform this operation.
    #[error("Not authorized")]
    Forbidden,
    /// A referenced entity is absent. Carries the client-facing message.
    #[error("{0}")]
    NotFound(&'static str),
    /// Payment callback integrity failure. Never retried automatically.
    #[error("Payment verification failed")]
    Signature,
    /// The requested booking-status transition is not allowed.
    #[error("This booking is already completed")]
    InvalidTransition,
    /// Confirmation was requested before the payment settled.
    #[error("Cannot confirm booking. Payment status is still {0}")]
    PaymentRequired(PaymentStatus),
    /// The booking is not in a state that permits the operation.
    #[error("Only completed bookings can be deleted")]
    InvalidState,
    /// Upstream payment provider failure; the caller may retry with a
    /// fresh intent.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),
    /// A repository (database) operation failed.
    #[error("Database error: {0}")]
    Db(RepositoryError),
    /// Some unexpected or unhandled error.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ServiceError {
    /// Maps a repository error, labelling `NotFound` with the entity the
    /// caller was looking for and translating uniqueness violations into
    /// field-specific validation errors.
    pub(crate) fn from_repo(e: RepositoryError, not_found: &'static str) -> Self {
        match e {
            RepositoryError::NotFound => ServiceError::NotFound(not_found),
            RepositoryError::Duplicate(field) => {
                ServiceError::Validation(format!("Duplicate value for {field}"))
            }
            other => ServiceError::Db(other),
        }
    }
}
