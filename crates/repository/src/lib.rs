//! # Data Repository Layer
//!
//! Repository traits and PostgreSQL implementations for the two aggregates:
//! listings (with their images and reviews) and bookings (with their line
//! items). Status-mutating booking writes are conditional updates keyed on
//! the previously observed status, so concurrent confirmations cannot both
//! land.

use thiserror::Error;
use tokio_postgres::error::SqlState;

pub mod bookings;
pub mod listings;
pub mod search;

pub use bookings::{BookingsRepository, PgBookingsRepository};
pub use listings::{ListingsRepository, PgListingsRepository};
pub use search::{ListingSearch, Page, SearchParam};

/// Error types that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database-related errors, wrapping the underlying PostgreSQL error
    #[error("Database error: {0}")]
    Db(tokio_postgres::Error),
    /// Failed to obtain a connection from the pool.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    /// No result found.
    #[error("Not found")]
    NotFound,
    /// A uniqueness constraint was violated for the named field.
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),
}

// Delegation impls so repositories can be shared between services.
mod arc_impls {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use model::{Booking, BookingStatus, Listing, Review, request::ListingFilter};
    use uuid::Uuid;

    use crate::search::Page;
    use crate::{BookingsRepository, ListingsRepository, RepositoryError};

    #[async_trait]
    impl<T: BookingsRepository + ?Sized> BookingsRepository for Arc<T> {
        async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
            (**self).insert(booking).await
        }
        async fn get_by_id(&self, id: Uuid) -> Result<Booking, RepositoryError> {
            (**self).get_by_id(id).await
        }
        async fn list_by_user(&self, user: Uuid) -> Result<Vec<Booking>, RepositoryError> {
            (**self).list_by_user(user).await
        }
        async fn list_all(&self) -> Result<Vec<Booking>, RepositoryError> {
            (**self).list_all().await
        }
        async fn mark_paid(
            &self,
            id: Uuid,
            transaction_id: &str,
            payment_method: &str,
            paid_at: DateTime<Utc>,
        ) -> Result<bool, RepositoryError> {
            (**self)
                .mark_paid(id, transaction_id, payment_method, paid_at)
                .await
        }
        async fn update_status(
            &self,
            id: Uuid,
            expected: BookingStatus,
            new: BookingStatus,
            check_out_date: Option<DateTime<Utc>>,
        ) -> Result<bool, RepositoryError> {
            (**self).update_status(id, expected, new, check_out_date).await
        }
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
            (**self).delete(id).await
        }
    }

    #[async_trait]
    impl<T: ListingsRepository + ?Sized> ListingsRepository for Arc<T> {
        async fn insert(&self, listing: &Listing) -> Result<(), RepositoryError> {
            (**self).insert(listing).await
        }
        async fn update(&self, listing: &Listing) -> Result<(), RepositoryError> {
            (**self).update(listing).await
        }
        async fn get_by_id(&self, id: Uuid) -> Result<Listing, RepositoryError> {
            (**self).get_by_id(id).await
        }
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
            (**self).delete(id).await
        }
        async fn list_all(&self) -> Result<Vec<Listing>, RepositoryError> {
            (**self).list_all().await
        }
        async fn count(&self, filter: &ListingFilter) -> Result<i64, RepositoryError> {
            (**self).count(filter).await
        }
        async fn search_page(
            &self,
            filter: &ListingFilter,
            page: Page,
        ) -> Result<Vec<Listing>, RepositoryError> {
            (**self).search_page(filter, page).await
        }
        async fn decrement_available_beds(
            &self,
            id: Uuid,
            count: i32,
        ) -> Result<(), RepositoryError> {
            (**self).decrement_available_beds(id, count).await
        }
        async fn upsert_review(
            &self,
            listing_id: Uuid,
            review: &Review,
        ) -> Result<(), RepositoryError> {
            (**self).upsert_review(listing_id, review).await
        }
        async fn reviews(&self, listing_id: Uuid) -> Result<Vec<Review>, RepositoryError> {
            (**self).reviews(listing_id).await
        }
        async fn delete_review(
            &self,
            listing_id: Uuid,
            user_id: Uuid,
        ) -> Result<(), RepositoryError> {
            (**self).delete_review(listing_id, user_id).await
        }
        async fn update_rating(
            &self,
            listing_id: Uuid,
            average_rating: f64,
            review_count: i32,
        ) -> Result<(), RepositoryError> {
            (**self).update_rating(listing_id, average_rating, review_count).await
        }
    }
}

impl From<tokio_postgres::Error> for RepositoryError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            // Constraint names are `<table>_pkey` / `<table>_<col>_key`;
            // surface the table so the boundary can word the message.
            let field = e
                .as_db_error()
                .and_then(|db| db.table())
                .map(|t| match t {
                    "reviews" => "review",
                    "bookings" => "booking",
                    "listings" => "listing",
                    _ => "record",
                })
                .unwrap_or("record");
            return RepositoryError::Duplicate(field);
        }
        RepositoryError::Db(e)
    }
}
