//! Booking lifecycle service: creation, payment verification, admin status
//! transitions, deletion and reads.
//!
//! Monetary and inventory rules live here, so every transition is guarded
//! in this layer rather than in the HTTP handlers.

use async_trait::async_trait;
use chrono::Utc;
use gateway::{GatewayConfig, GatewayOrder, PaymentGateway};
use model::{
    Booking, BookingStatus, PaymentInfo, PaymentStatus, Role,
    request::{CreateBookingRequest, PaymentIntentRequest, VerifyPaymentRequest},
};
use repository::{BookingsRepository, ListingsRepository};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::ServiceError;
use crate::policy::{Actor, authorize};

/// Payment method recorded for gateway-verified payments.
const GATEWAY_PAYMENT_METHOD: &str = "Razorpay";

/// Admin listing of all bookings plus the revenue aggregate.
///
/// `total_revenue` is the unconditional sum of `totalAmount` across every
/// booking, including unpaid and cancelled ones. The dashboards consuming
/// this number expect exactly that figure.
#[derive(Debug)]
pub struct BookingLedger {
    pub bookings: Vec<Booking>,
    pub total_revenue: i64,
}

/// Business operations of the booking lifecycle.
#[async_trait]
pub trait BookingService: Send + Sync {
    /// Persists a new Pending booking against the caller-supplied price
    /// snapshot. No inventory is touched here.
    async fn create_booking(
        &self,
        actor: &Actor,
        req: CreateBookingRequest,
    ) -> Result<Booking, ServiceError>;

    /// Mints a remote payment intent for the amount (major units).
    async fn request_payment_intent(
        &self,
        req: PaymentIntentRequest,
    ) -> Result<GatewayOrder, ServiceError>;

    /// Validates a gateway callback and, on the first valid delivery,
    /// flips the booking to Paid/Confirmed. Duplicate deliveries are
    /// idempotent successes.
    async fn verify_payment(&self, req: VerifyPaymentRequest) -> Result<Booking, ServiceError>;

    /// Admin status transition, including the inventory decrement on
    /// confirmation.
    async fn update_booking_status(
        &self,
        actor: &Actor,
        id: Uuid,
        new_status: BookingStatus,
    ) -> Result<Booking, ServiceError>;

    /// Deletes a booking whose lifecycle is fully spent.
    async fn delete_booking(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError>;

    async fn get_booking(&self, actor: &Actor, id: Uuid) -> Result<Booking, ServiceError>;
    async fn my_bookings(&self, actor: &Actor) -> Result<Vec<Booking>, ServiceError>;
    async fn list_bookings(&self, actor: &Actor) -> Result<BookingLedger, ServiceError>;
}

/// Implementation of [`BookingService`] over injected repositories and a
/// payment gateway.
pub struct BookingLifecycleService<B, L, G> {
    bookings: B,
    listings: L,
    gateway: G,
    gateway_config: GatewayConfig,
}

impl<B, L, G> BookingLifecycleService<B, L, G>
where
    B: BookingsRepository,
    L: ListingsRepository,
    G: PaymentGateway,
{
    pub fn new(bookings: B, listings: L, gateway: G, gateway_config: GatewayConfig) -> Self {
        Self {
            bookings,
            listings,
            gateway,
            gateway_config,
        }
    }

    /// Decrements one bed per line item, flooring at zero. Per-item and
    /// best-effort: a failure partway through leaves earlier decrements in
    /// place.
    async fn reduce_inventory(&self, booking: &Booking) -> Result<(), ServiceError> {
        for item in &booking.booking_items {
            self.listings
                .decrement_available_beds(item.property, 1)
                .await
                .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<B, L, G> BookingService for BookingLifecycleService<B, L, G>
where
    B: BookingsRepository,
    L: ListingsRepository,
    G: PaymentGateway,
{
    #[instrument(skip(self, req), fields(user = %actor.id))]
    async fn create_booking(
        &self,
        actor: &Actor,
        req: CreateBookingRequest,
    ) -> Result<Booking, ServiceError> {
        if req.booking_items.is_empty() {
            return Err(ServiceError::Validation("No booking items found".into()));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            tenant_info: req.tenant_info,
            booking_items: req.booking_items,
            // A fresh booking is always Pending/Pending regardless of any
            // payment fields the client tried to send.
            booking_status: BookingStatus::Pending,
            user: actor.id,
            payment_info: PaymentInfo::default(),
            paid_at: None,
            rent_amount: req.rent_amount,
            security_deposit: req.security_deposit.unwrap_or(0),
            maintenance_charges: req.maintenance_charges.unwrap_or(0),
            total_amount: req.total_amount,
            check_in_date: req.check_in_date,
            check_out_date: None,
            created_at: Utc::now(),
        };

        self.bookings
            .insert(&booking)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;
        info!(booking = %booking.id, "booking created");
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn request_payment_intent(
        &self,
        req: PaymentIntentRequest,
    ) -> Result<GatewayOrder, ServiceError> {
        if req.amount <= 0 {
            return Err(ServiceError::Validation(
                "Invalid or zero amount provided for payment.".into(),
            ));
        }
        let amount_minor = req.amount.checked_mul(100).ok_or_else(|| {
            ServiceError::Validation("Invalid or zero amount provided for payment.".into())
        })?;

        // Bind the receipt to the booking when the client names one, so the
        // gateway record is correlatable server-side.
        let receipt = match req.booking_id {
            Some(id) => format!("booking_{id}"),
            None => format!("booking_{}", Utc::now().timestamp_millis()),
        };

        Ok(self.gateway.create_intent(amount_minor, &receipt).await?)
    }

    #[instrument(skip(self, req))]
    async fn verify_payment(&self, req: VerifyPaymentRequest) -> Result<Booking, ServiceError> {
        let (Some(payment_id), Some(order_id), Some(signature), Some(booking_id)) = (
            req.razorpay_payment_id,
            req.razorpay_order_id,
            req.razorpay_signature,
            req.booking_id,
        ) else {
            return Err(ServiceError::Validation("Missing payment details".into()));
        };

        if !gateway::verify_signature(
            &self.gateway_config.key_secret,
            &order_id,
            &payment_id,
            &signature,
        ) {
            warn!(booking = %booking_id, "payment signature mismatch");
            return Err(ServiceError::Signature);
        }

        let booking = self
            .bookings
            .get_by_id(booking_id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;

        // Duplicate callback delivery: already verified, succeed without
        // touching anything.
        if booking.payment_info.status == PaymentStatus::Paid {
            info!(booking = %booking_id, "payment already verified");
            return Ok(booking);
        }

        let transitioned = self
            .bookings
            .mark_paid(booking_id, &payment_id, GATEWAY_PAYMENT_METHOD, Utc::now())
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;
        if !transitioned {
            // A concurrent delivery won the conditional write; same outcome.
            info!(booking = %booking_id, "payment verified by a concurrent callback");
        }

        self.bookings
            .get_by_id(booking_id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))
    }

    #[instrument(skip(self), fields(admin = %actor.id))]
    async fn update_booking_status(
        &self,
        actor: &Actor,
        id: Uuid,
        new_status: BookingStatus,
    ) -> Result<Booking, ServiceError> {
        authorize(actor.role, &[Role::Admin])?;

        let booking = self
            .bookings
            .get_by_id(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;

        if new_status == BookingStatus::Confirmed
            && booking.payment_info.status != PaymentStatus::Paid
        {
            return Err(ServiceError::PaymentRequired(booking.payment_info.status));
        }

        // Completed is terminal, whatever the requested target.
        if booking.booking_status == BookingStatus::Completed {
            return Err(ServiceError::InvalidTransition);
        }

        let check_out_date = (new_status == BookingStatus::Completed).then(Utc::now);
        let transitioned = self
            .bookings
            .update_status(id, booking.booking_status, new_status, check_out_date)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;
        if !transitioned {
            return Err(ServiceError::Validation(
                "Booking was updated concurrently, please retry".into(),
            ));
        }

        // The conditional write above makes this decrement happen at most
        // once per booking even under racing confirmations.
        if new_status == BookingStatus::Confirmed {
            self.reduce_inventory(&booking).await?;
        }

        self.bookings
            .get_by_id(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))
    }

    #[instrument(skip(self), fields(admin = %actor.id))]
    async fn delete_booking(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        authorize(actor.role, &[Role::Admin])?;

        let booking = self
            .bookings
            .get_by_id(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;

        if booking.booking_status != BookingStatus::Completed {
            return Err(ServiceError::InvalidState);
        }

        self.bookings
            .delete(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;
        info!(booking = %id, "booking deleted");
        Ok(())
    }

    async fn get_booking(&self, actor: &Actor, id: Uuid) -> Result<Booking, ServiceError> {
        let booking = self
            .bookings
            .get_by_id(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;

        if booking.user != actor.id && !actor.is_admin() {
            return Err(ServiceError::Forbidden);
        }
        Ok(booking)
    }

    async fn my_bookings(&self, actor: &Actor) -> Result<Vec<Booking>, ServiceError> {
        self.bookings
            .list_by_user(actor.id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))
    }

    async fn list_bookings(&self, actor: &Actor) -> Result<BookingLedger, ServiceError> {
        authorize(actor.role, &[Role::Admin])?;

        let bookings = self
            .bookings
            .list_all()
            .await
            .map_err(|e| ServiceError::from_repo(e, "Booking not found"))?;
        let total_revenue = bookings.iter().map(|b| b.total_amount).sum();
        Ok(BookingLedger {
            bookings,
            total_revenue,
        })
    }
}
