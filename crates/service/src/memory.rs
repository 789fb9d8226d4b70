//! In-memory repository and gateway implementations for service tests.
//! They mirror the semantics of the Postgres implementations: conditional
//! status writes, floor-at-zero inventory, structural one-review-per-user.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway::{GatewayError, GatewayOrder, PaymentGateway};
use model::{
    Booking, BookingStatus, Listing, PaymentStatus, Review,
    request::{ListingFilter, SortOrder},
};
use repository::{
    BookingsRepository, ListingsRepository, RepositoryError,
    search::Page,
};
use uuid::Uuid;

#[derive(Default)]
pub struct MemBookings {
    inner: Mutex<HashMap<Uuid, Booking>>,
}

#[async_trait]
impl BookingsRepository for MemBookings {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        self.inner
            .lock()
            .unwrap()
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Booking, RepositoryError> {
        self.inner
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_by_user(&self, user: Uuid) -> Result<Vec<Booking>, RepositoryError> {
        let mut bookings: Vec<Booking> = self
            .inner
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user == user)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, RepositoryError> {
        let mut bookings: Vec<Booking> = self.inner.lock().unwrap().values().cloned().collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        transaction_id: &str,
        payment_method: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut map = self.inner.lock().unwrap();
        let booking = map.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if booking.payment_info.status == PaymentStatus::Paid {
            return Ok(false);
        }
        booking.payment_info.transaction_id = Some(transaction_id.to_string());
        booking.payment_info.status = PaymentStatus::Paid;
        booking.payment_info.payment_method = Some(payment_method.to_string());
        booking.paid_at = Some(paid_at);
        booking.booking_status = BookingStatus::Confirmed;
        Ok(true)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        new: BookingStatus,
        check_out_date: Option<DateTime<Utc>>,
    ) -> Result<bool, RepositoryError> {
        let mut map = self.inner.lock().unwrap();
        let booking = map.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if booking.booking_status != expected {
            return Ok(false);
        }
        booking.booking_status = new;
        if check_out_date.is_some() {
            booking.check_out_date = check_out_date;
        }
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.inner
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub struct MemListings {
    listings: Mutex<HashMap<Uuid, Listing>>,
    reviews: Mutex<HashMap<Uuid, Vec<Review>>>,
}

impl MemListings {
    pub fn seed(&self, listing: Listing) {
        self.listings.lock().unwrap().insert(listing.id, listing);
    }

    pub fn available_beds(&self, id: Uuid) -> i32 {
        self.listings.lock().unwrap()[&id].available_beds
    }

    fn matching(&self, filter: &ListingFilter) -> Vec<Listing> {
        let keyword = filter
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);
        let mut matches: Vec<Listing> = self
            .listings
            .lock()
            .unwrap()
            .values()
            .filter(|l| {
                keyword.as_deref().is_none_or(|k| {
                    l.title.to_lowercase().contains(k)
                        || l.city.to_lowercase().contains(k)
                        || l.locality.to_lowercase().contains(k)
                }) && filter.min_price.is_none_or(|min| l.starting_rent >= min)
                    && filter.max_price.is_none_or(|max| l.starting_rent <= max)
                    && filter.property_type.is_none_or(|t| l.property_type == t)
            })
            .cloned()
            .collect();
        match filter.sort {
            Some(SortOrder::PriceAsc) => matches.sort_by_key(|l| l.starting_rent),
            Some(SortOrder::PriceDesc) => {
                matches.sort_by_key(|l| std::cmp::Reverse(l.starting_rent))
            }
            None => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        matches
    }
}

#[async_trait]
impl ListingsRepository for MemListings {
    async fn insert(&self, listing: &Listing) -> Result<(), RepositoryError> {
        self.listings
            .lock()
            .unwrap()
            .insert(listing.id, listing.clone());
        Ok(())
    }

    async fn update(&self, listing: &Listing) -> Result<(), RepositoryError> {
        let mut map = self.listings.lock().unwrap();
        if !map.contains_key(&listing.id) {
            return Err(RepositoryError::NotFound);
        }
        map.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Listing, RepositoryError> {
        self.listings
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.listings
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self.listings.lock().unwrap().values().cloned().collect())
    }

    async fn count(&self, filter: &ListingFilter) -> Result<i64, RepositoryError> {
        Ok(self.matching(filter).len() as i64)
    }

    async fn search_page(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self
            .matching(filter)
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn decrement_available_beds(&self, id: Uuid, count: i32) -> Result<(), RepositoryError> {
        let mut map = self.listings.lock().unwrap();
        let listing = map.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        listing.available_beds = (listing.available_beds - count).max(0);
        Ok(())
    }

    async fn upsert_review(&self, listing_id: Uuid, review: &Review) -> Result<(), RepositoryError> {
        let mut map = self.reviews.lock().unwrap();
        let reviews = map.entry(listing_id).or_default();
        match reviews.iter_mut().find(|r| r.user == review.user) {
            Some(existing) => *existing = review.clone(),
            None => reviews.push(review.clone()),
        }
        Ok(())
    }

    async fn reviews(&self, listing_id: Uuid) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&listing_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_review(&self, listing_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError> {
        let mut map = self.reviews.lock().unwrap();
        let reviews = map.get_mut(&listing_id).ok_or(RepositoryError::NotFound)?;
        let before = reviews.len();
        reviews.retain(|r| r.user != user_id);
        if reviews.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_rating(
        &self,
        listing_id: Uuid,
        average_rating: f64,
        review_count: i32,
    ) -> Result<(), RepositoryError> {
        let mut map = self.listings.lock().unwrap();
        let listing = map.get_mut(&listing_id).ok_or(RepositoryError::NotFound)?;
        listing.average_rating = average_rating;
        listing.review_count = review_count;
        Ok(())
    }
}

/// Gateway double: mints sequential order ids, records the last receipt,
/// and can be told to fail.
#[derive(Default)]
pub struct MemGateway {
    counter: AtomicU64,
    pub fail: AtomicBool,
    pub last_receipt: Mutex<Option<String>>,
}

#[async_trait]
impl PaymentGateway for MemGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 502,
                message: "gateway unavailable".into(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_receipt.lock().unwrap() = Some(receipt.to_string());
        Ok(GatewayOrder {
            id: format!("order_test_{n}"),
            amount: amount_minor,
            currency: "INR".into(),
            receipt: receipt.to_string(),
            status: Some("created".into()),
        })
    }
}
