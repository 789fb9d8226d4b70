//! Bookings repository. A booking and its line items are written in one
//! transaction (document-level atomicity); the payment and status mutations
//! are conditional updates so duplicate callbacks and racing confirmations
//! resolve to a single transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use model::{Booking, BookingItem, BookingStatus, PaymentInfo, PaymentStatus, TenantInfo};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::RepositoryError;

const BOOKING_COLS: &str = "id, tenant_full_name, tenant_phone_number, tenant_email, \
     tenant_address, tenant_city, tenant_state, tenant_pin_code, booking_status, user_id, \
     payment_transaction_id, payment_status, payment_method, paid_at, rent_amount, \
     security_deposit, maintenance_charges, total_amount, check_in_date, check_out_date, created_at";

/// Repository interface for booking storage.
#[async_trait]
pub trait BookingsRepository: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Booking, RepositoryError>;

    /// Bookings owned by the user, newest first.
    async fn list_by_user(&self, user: Uuid) -> Result<Vec<Booking>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Booking>, RepositoryError>;

    /// Records a verified payment and confirms the booking, but only while
    /// the stored payment status is still not `Paid`. Returns `true` when
    /// this call performed the transition, `false` when a previous delivery
    /// of the same callback already had.
    async fn mark_paid(
        &self,
        id: Uuid,
        transaction_id: &str,
        payment_method: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Compare-and-swap status transition: the write lands only if the
    /// stored status still equals `expected`. Returns `true` on success,
    /// `false` when another writer got there first.
    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        new: BookingStatus,
        check_out_date: Option<DateTime<Utc>>,
    ) -> Result<bool, RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of [`BookingsRepository`].
pub struct PgBookingsRepository {
    pool: Pool,
}

impl PgBookingsRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn load_items(
        &self,
        conn: &deadpool_postgres::Object,
        booking_id: Uuid,
    ) -> Result<Vec<BookingItem>, RepositoryError> {
        let rows = conn
            .query(
                "SELECT listing_id, property_title, room_type, monthly_rent, image, stay_duration_months
                 FROM booking_items WHERE booking_id = $1 ORDER BY position",
                &[&booking_id],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|r| BookingItem {
                property: r.get("listing_id"),
                property_title: r.get("property_title"),
                room_type: r.get("room_type"),
                monthly_rent: r.get("monthly_rent"),
                image: r.get("image"),
                stay_duration_months: r.get("stay_duration_months"),
            })
            .collect())
    }
}

fn booking_from_row(row: &Row) -> Booking {
    Booking {
        id: row.get("id"),
        tenant_info: TenantInfo {
            full_name: row.get("tenant_full_name"),
            phone_number: row.get("tenant_phone_number"),
            email: row.get("tenant_email"),
            address: row.get("tenant_address"),
            city: row.get("tenant_city"),
            state: row.get("tenant_state"),
            pin_code: row.get("tenant_pin_code"),
        },
        booking_items: Vec::new(), // filled by the caller
        booking_status: row
            .get::<_, String>("booking_status")
            .parse()
            .unwrap_or(BookingStatus::Pending),
        user: row.get("user_id"),
        payment_info: PaymentInfo {
            transaction_id: row.get("payment_transaction_id"),
            status: row
                .get::<_, String>("payment_status")
                .parse()
                .unwrap_or(PaymentStatus::Pending),
            payment_method: row.get("payment_method"),
        },
        paid_at: row.get("paid_at"),
        rent_amount: row.get("rent_amount"),
        security_deposit: row.get("security_deposit"),
        maintenance_charges: row.get("maintenance_charges"),
        total_amount: row.get("total_amount"),
        check_in_date: row.get("check_in_date"),
        check_out_date: row.get("check_out_date"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl BookingsRepository for PgBookingsRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await?;
        let tx = conn.transaction().await?;
        tx.execute(
            "INSERT INTO bookings (
                id, tenant_full_name, tenant_phone_number, tenant_email, tenant_address,
                tenant_city, tenant_state, tenant_pin_code, booking_status, user_id,
                payment_transaction_id, payment_status, payment_method, paid_at,
                rent_amount, security_deposit, maintenance_charges, total_amount,
                check_in_date, check_out_date, created_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21)",
            &[
                &booking.id,
                &booking.tenant_info.full_name,
                &booking.tenant_info.phone_number,
                &booking.tenant_info.email,
                &booking.tenant_info.address,
                &booking.tenant_info.city,
                &booking.tenant_info.state,
                &booking.tenant_info.pin_code,
                &booking.booking_status.as_str(),
                &booking.user,
                &booking.payment_info.transaction_id,
                &booking.payment_info.status.as_str(),
                &booking.payment_info.payment_method,
                &booking.paid_at,
                &booking.rent_amount,
                &booking.security_deposit,
                &booking.maintenance_charges,
                &booking.total_amount,
                &booking.check_in_date,
                &booking.check_out_date,
                &booking.created_at,
            ],
        )
        .await?;
        for (position, item) in booking.booking_items.iter().enumerate() {
            tx.execute(
                "INSERT INTO booking_items (
                    booking_id, position, listing_id, property_title, room_type,
                    monthly_rent, image, stay_duration_months
                ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
                &[
                    &booking.id,
                    &(position as i32),
                    &item.property,
                    &item.property_title,
                    &item.room_type,
                    &item.monthly_rent,
                    &item.image,
                    &item.stay_duration_months,
                ],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Booking, RepositoryError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {BOOKING_COLS} FROM bookings WHERE id = $1"),
                &[&id],
            )
            .await?;
        match row {
            Some(row) => {
                let mut booking = booking_from_row(&row);
                booking.booking_items = self.load_items(&conn, id).await?;
                Ok(booking)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list_by_user(&self, user: Uuid) -> Result<Vec<Booking>, RepositoryError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {BOOKING_COLS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
                ),
                &[&user],
            )
            .await?;
        let mut bookings = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut booking = booking_from_row(row);
            booking.booking_items = self.load_items(&conn, booking.id).await?;
            bookings.push(booking);
        }
        Ok(bookings)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, RepositoryError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                &format!("SELECT {BOOKING_COLS} FROM bookings ORDER BY created_at DESC"),
                &[],
            )
            .await?;
        let mut bookings = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut booking = booking_from_row(row);
            booking.booking_items = self.load_items(&conn, booking.id).await?;
            bookings.push(booking);
        }
        Ok(bookings)
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        transaction_id: &str,
        payment_method: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get().await?;
        let updated = conn
            .execute(
                "UPDATE bookings SET
                    payment_transaction_id = $2,
                    payment_status = 'Paid',
                    payment_method = $3,
                    paid_at = $4,
                    booking_status = 'Confirmed'
                 WHERE id = $1 AND payment_status <> 'Paid'",
                &[&id, &transaction_id, &payment_method, &paid_at],
            )
            .await?;
        Ok(updated == 1)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        new: BookingStatus,
        check_out_date: Option<DateTime<Utc>>,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get().await?;
        let updated = conn
            .execute(
                "UPDATE bookings SET
                    booking_status = $3,
                    check_out_date = COALESCE($4, check_out_date)
                 WHERE id = $1 AND booking_status = $2",
                &[&id, &expected.as_str(), &new.as_str(), &check_out_date],
            )
            .await?;
        Ok(updated == 1)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        let deleted = conn
            .execute("DELETE FROM bookings WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
