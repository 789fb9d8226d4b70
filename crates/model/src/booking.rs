//! Booking aggregate: tenant snapshot, frozen line items, payment sub-record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BookingStatus, PaymentStatus};

/// Tenant contact details captured at booking time. Immutable afterwards:
/// later edits to the user profile must not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    pub full_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pin_code: Option<String>,
}

/// One booked listing, frozen at creation time. `property` is a soft
/// reference: the listing may be edited or deleted later without touching
/// this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingItem {
    pub property: Uuid,
    pub property_title: String,
    /// Resolved sharing-type label, e.g. "Single" / "Twin" / "Triple".
    pub room_type: String,
    #[serde(deserialize_with = "crate::coerce::money")]
    pub monthly_rent: i64,
    pub image: String,
    #[serde(default = "default_stay_duration")]
    pub stay_duration_months: i32,
}

fn default_stay_duration() -> i32 {
    1
}

/// Payment sub-record. `status` only ever moves Pending -> Paid or
/// Pending -> Failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl Default for PaymentInfo {
    fn default() -> Self {
        Self {
            transaction_id: None,
            status: PaymentStatus::Pending,
            payment_method: None,
        }
    }
}

/// A tenant's reservation against one or more listings, carrying
/// its own status and payment lifecycle. Monetary totals and line items are
/// fixed at creation; only the status fields, the payment sub-record and
/// `checkOutDate` mutate afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub tenant_info: TenantInfo,
    pub booking_items: Vec<BookingItem>,
    pub booking_status: BookingStatus,
    /// The tenant who created the booking.
    pub user: Uuid,
    pub payment_info: PaymentInfo,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub rent_amount: i64,
    pub security_deposit: i64,
    pub maintenance_charges: i64,
    pub total_amount: i64,
    pub check_in_date: DateTime<Utc>,
    #[serde(default)]
    pub check_out_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
