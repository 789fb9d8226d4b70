//! Typed request payloads, one per operation.
//!
//! The original clients send loosely-shaped JSON; here every operation gets
//! an explicit schema, with monetary coercion applied once at the boundary
//! (see [`crate::coerce`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::{BookingItem, TenantInfo};
use crate::listing::{ImageRef, RoomTypeRents};
use crate::{BookingStatus, ForWhom, PropertyType};

/// Payload for creating a booking. Line items arrive pre-snapshotted: the
/// caller has already chosen the room type and rent, and the server does not
/// re-validate them against the listing's current price.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub tenant_info: TenantInfo,
    #[serde(default)]
    pub booking_items: Vec<BookingItem>,
    #[serde(deserialize_with = "crate::coerce::money")]
    pub rent_amount: i64,
    #[serde(default, deserialize_with = "crate::coerce::money_opt")]
    pub security_deposit: Option<i64>,
    #[serde(default, deserialize_with = "crate::coerce::money_opt")]
    pub maintenance_charges: Option<i64>,
    #[serde(deserialize_with = "crate::coerce::money")]
    pub total_amount: i64,
    pub check_in_date: DateTime<Utc>,
}

/// Payload for minting a gateway payment intent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    #[serde(deserialize_with = "crate::coerce::money")]
    pub amount: i64,
    /// When present, the gateway receipt is bound to this booking id.
    #[serde(default)]
    pub booking_id: Option<Uuid>,
}

/// Gateway callback payload. Field names are the gateway's own; all four are
/// required, but presence is checked in the service so the failure surfaces
/// as a validation error rather than a deserialization one.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
    #[serde(default, rename = "bookingId")]
    pub booking_id: Option<Uuid>,
}

/// Admin request to move a booking to a new status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Submit (or replace) the calling user's review of a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub property_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

/// Sort orders accepted by the listing search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "price_asc")]
    PriceAsc,
    #[serde(rename = "price_desc")]
    PriceDesc,
}

/// Query parameters of the listing search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    /// 1-indexed page number; absent means page 1.
    #[serde(default)]
    pub page: Option<u32>,
}

/// Owner request to publish a listing. Images arrive as blob-store
/// references minted by the upload collaborator, never as raw bytes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub title: String,
    pub property_type: PropertyType,
    pub for_whom: ForWhom,
    pub description: String,
    #[serde(deserialize_with = "crate::coerce::money")]
    pub starting_rent: i64,
    #[serde(default)]
    pub room_types: RoomTypeRents,
    pub locality: String,
    pub city: String,
    pub full_address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default = "default_one")]
    pub total_rooms: i32,
    #[serde(default = "default_one")]
    pub available_beds: i32,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub phone_number: String,
}

fn default_one() -> i32 {
    1
}

/// Partial update of a listing; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub for_whom: Option<ForWhom>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::coerce::money_opt")]
    pub starting_rent: Option<i64>,
    #[serde(default)]
    pub room_types: Option<RoomTypeRents>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub images: Option<Vec<ImageRef>>,
    #[serde(default)]
    pub total_rooms: Option<i32>,
    #[serde(default)]
    pub available_beds: Option<i32>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub phone_number: Option<String>,
}
