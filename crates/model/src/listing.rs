//! Listing aggregate: a rentable property with inventory, rent tiers and
//! review-derived rating fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ForWhom, PropertyType};

/// Blob-store reference for a listing photo. The core never holds raw bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub public_id: String,
    pub url: String,
}

/// Monthly rent per sharing type. Every tier is optional; `startingRent`
/// remains the advertised floor price.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeRents {
    #[serde(default, deserialize_with = "crate::coerce::money_opt")]
    pub single: Option<i64>,
    #[serde(default, deserialize_with = "crate::coerce::money_opt")]
    pub twin: Option<i64>,
    #[serde(default, deserialize_with = "crate::coerce::money_opt")]
    pub triple: Option<i64>,
    #[serde(default, deserialize_with = "crate::coerce::money_opt")]
    pub four_sharing: Option<i64>,
}

/// One user's review of one listing. At most one review exists per
/// (listing, user) pair; a second submission replaces the first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: Uuid,
    pub name: String,
    pub rating: i32,
    pub comment: String,
}

/// A rentable property. `availableBeds` is mutated only by the booking
/// lifecycle on confirmation and never goes below zero; `averageRating` and
/// `reviewCount` are always recomputed from the stored reviews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub property_type: PropertyType,
    pub for_whom: ForWhom,
    pub description: String,
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
    pub total_rooms: i32,
    pub available_beds: i32,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub owner: Uuid,
    pub phone_number: String,
    pub average_rating: f64,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Rating aggregates `(average, count)` for a review set. An empty set
    /// yields a zero rating, not NaN.
    pub fn aggregate(reviews: &[Review]) -> (f64, i32) {
        if reviews.is_empty() {
            (0.0, 0)
        } else {
            let sum = reviews.iter().map(|r| r.rating as f64).sum::<f64>();
            (sum / reviews.len() as f64, reviews.len() as i32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            id: Uuid::nil(),
            title: "Sunrise PG".into(),
            property_type: PropertyType::Pg,
            for_whom: ForWhom::Boys,
            description: "Quiet PG near the metro".into(),
            starting_rent: 5000,
            room_types: RoomTypeRents {
                single: Some(9000),
                twin: Some(7000),
                triple: Some(5000),
                four_sharing: None,
            },
            locality: "Koramangala".into(),
            city: "Bengaluru".into(),
            full_address: "12, 5th Block, Koramangala".into(),
            latitude: None,
            longitude: None,
            images: vec![],
            total_rooms: 10,
            available_beds: 4,
            amenities: vec!["wifi".into()],
            owner: Uuid::nil(),
            phone_number: "+919800000001".into(),
            average_rating: 0.0,
            review_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn listing_uses_camel_case_wire_names() {
        let json = serde_json::to_value(sample_listing()).unwrap();
        assert_eq!(json["startingRent"], 5000);
        assert_eq!(json["availableBeds"], 4);
        assert_eq!(json["roomTypes"]["fourSharing"], serde_json::Value::Null);
        assert_eq!(json["propertyType"], "PG");
    }

    #[test]
    fn rating_aggregates_follow_reviews() {
        let reviews = vec![
            Review {
                user: Uuid::new_v4(),
                name: "A".into(),
                rating: 5,
                comment: "great".into(),
            },
            Review {
                user: Uuid::new_v4(),
                name: "B".into(),
                rating: 2,
                comment: "meh".into(),
            },
        ];
        assert_eq!(Review::aggregate(&reviews), (3.5, 2));
        assert_eq!(Review::aggregate(&[]), (0.0, 0));
    }
}
