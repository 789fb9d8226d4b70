//! Domain model for the PG / hostel booking backend.
//!
//! Wire shapes use the camelCase field names the existing clients expect
//! (`bookingStatus`, `paymentInfo`, `totalAmount`, ...), so every struct here
//! doubles as the JSON contract of the HTTP layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod booking;
pub mod coerce;
pub mod listing;
pub mod request;

pub use booking::{Booking, BookingItem, PaymentInfo, TenantInfo};
pub use listing::{ImageRef, Listing, Review, RoomTypeRents};
pub use request::{
    CreateBookingRequest, CreateListingRequest, CreateReviewRequest, ListingFilter,
    PaymentIntentRequest, SortOrder, UpdateListingRequest, UpdateStatusRequest,
    VerifyPaymentRequest,
};

/// Raised when a stored status string does not match any known variant.
#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

string_enum!(
    /// Lifecycle state of a booking.
    BookingStatus, "booking status", {
        Pending => "Pending",
        Confirmed => "Confirmed",
        Cancelled => "Cancelled",
        Completed => "Completed",
    }
);

string_enum!(
    /// State of the payment sub-record attached to a booking.
    PaymentStatus, "payment status", {
        Pending => "Pending",
        Paid => "Paid",
        Failed => "Failed",
    }
);

string_enum!(
    /// Kind of rentable property.
    PropertyType, "property type", {
        Pg => "PG",
        Hostel => "Hostel",
        Room => "Room",
        Flat => "Flat",
    }
);

string_enum!(
    /// Target audience of a listing.
    ForWhom, "audience", {
        Boys => "Boys",
        Girls => "Girls",
        Both => "Both",
    }
);

string_enum!(
    /// Role attached to an authenticated actor by the auth provider.
    Role, "role", {
        Tenant => "tenant",
        Owner => "owner",
        Admin => "admin",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_status_round_trips_through_str() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "Shipped".parse::<BookingStatus>().unwrap_err();
        assert!(err.to_string().contains("Shipped"));
    }

    #[test]
    fn role_uses_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"tenant\"").unwrap(),
            Role::Tenant
        );
    }

    #[test]
    fn property_type_matches_catalogue_names() {
        assert_eq!(PropertyType::Pg.as_str(), "PG");
        assert_eq!("Flat".parse::<PropertyType>().unwrap(), PropertyType::Flat);
    }
}
