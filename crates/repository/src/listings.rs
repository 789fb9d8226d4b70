//! Listings repository: property documents, their images and reviews, and
//! the one inventory mutation the booking lifecycle performs.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use model::{ImageRef, Listing, Review, RoomTypeRents, request::ListingFilter};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::search::{ListingSearch, Page, SearchParam};
use crate::RepositoryError;

const LISTING_COLS: &str = "id, title, property_type, for_whom, description, starting_rent, \
     rent_single, rent_twin, rent_triple, rent_four, locality, city, full_address, \
     latitude, longitude, total_rooms, available_beds, amenities, owner_id, phone_number, \
     average_rating, review_count, created_at";

/// Repository interface for listing storage.
///
/// Reviews live with the listing aggregate; rating aggregates are written
/// back explicitly after the caller recomputes them from the review set.
#[async_trait]
pub trait ListingsRepository: Send + Sync {
    async fn insert(&self, listing: &Listing) -> Result<(), RepositoryError>;
    async fn update(&self, listing: &Listing) -> Result<(), RepositoryError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Listing, RepositoryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Listing>, RepositoryError>;

    /// Number of listings matching the filter, ignoring pagination.
    async fn count(&self, filter: &ListingFilter) -> Result<i64, RepositoryError>;

    /// One fixed-size page of matching listings.
    async fn search_page(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> Result<Vec<Listing>, RepositoryError>;

    /// Decrements `available_beds`, flooring at zero. Fails with `NotFound`
    /// if the listing vanished between booking creation and confirmation.
    async fn decrement_available_beds(&self, id: Uuid, count: i32) -> Result<(), RepositoryError>;

    /// Inserts or replaces the user's review of the listing.
    async fn upsert_review(&self, listing_id: Uuid, review: &Review) -> Result<(), RepositoryError>;
    async fn reviews(&self, listing_id: Uuid) -> Result<Vec<Review>, RepositoryError>;
    async fn delete_review(&self, listing_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError>;

    /// Persists recomputed rating aggregates.
    async fn update_rating(
        &self,
        listing_id: Uuid,
        average_rating: f64,
        review_count: i32,
    ) -> Result<(), RepositoryError>;
}

/// PostgreSQL implementation of [`ListingsRepository`].
pub struct PgListingsRepository {
    pool: Pool,
}

impl PgListingsRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn listing_from_row(row: &Row) -> Listing {
    Listing {
        id: row.get("id"),
        title: row.get("title"),
        property_type: row
            .get::<_, String>("property_type")
            .parse()
            .unwrap_or(model::PropertyType::Pg),
        for_whom: row
            .get::<_, String>("for_whom")
            .parse()
            .unwrap_or(model::ForWhom::Both),
        description: row.get("description"),
        starting_rent: row.get("starting_rent"),
        room_types: RoomTypeRents {
            single: row.get("rent_single"),
            twin: row.get("rent_twin"),
            triple: row.get("rent_triple"),
            four_sharing: row.get("rent_four"),
        },
        locality: row.get("locality"),
        city: row.get("city"),
        full_address: row.get("full_address"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        images: Vec::new(), // filled by the caller
        total_rooms: row.get("total_rooms"),
        available_beds: row.get("available_beds"),
        amenities: row.get("amenities"),
        owner: row.get("owner_id"),
        phone_number: row.get("phone_number"),
        average_rating: row.get("average_rating"),
        review_count: row.get("review_count"),
        created_at: row.get("created_at"),
    }
}

impl PgListingsRepository {
    async fn load_images(
        &self,
        conn: &deadpool_postgres::Object,
        listing_id: Uuid,
    ) -> Result<Vec<ImageRef>, RepositoryError> {
        let rows = conn
            .query(
                "SELECT public_id, url FROM listing_images WHERE listing_id = $1 ORDER BY position",
                &[&listing_id],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|r| ImageRef {
                public_id: r.get("public_id"),
                url: r.get("url"),
            })
            .collect())
    }
}

#[async_trait]
impl ListingsRepository for PgListingsRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await?;
        let tx = conn.transaction().await?;
        tx.execute(
            "INSERT INTO listings (
                id, title, property_type, for_whom, description, starting_rent,
                rent_single, rent_twin, rent_triple, rent_four, locality, city,
                full_address, latitude, longitude, total_rooms, available_beds,
                amenities, owner_id, phone_number, average_rating, review_count, created_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20,$21,$22,$23)",
            &[
                &listing.id,
                &listing.title,
                &listing.property_type.as_str(),
                &listing.for_whom.as_str(),
                &listing.description,
                &listing.starting_rent,
                &listing.room_types.single,
                &listing.room_types.twin,
                &listing.room_types.triple,
                &listing.room_types.four_sharing,
                &listing.locality,
                &listing.city,
                &listing.full_address,
                &listing.latitude,
                &listing.longitude,
                &listing.total_rooms,
                &listing.available_beds,
                &listing.amenities,
                &listing.owner,
                &listing.phone_number,
                &listing.average_rating,
                &listing.review_count,
                &listing.created_at,
            ],
        )
        .await?;
        for (position, image) in listing.images.iter().enumerate() {
            tx.execute(
                "INSERT INTO listing_images (listing_id, position, public_id, url) VALUES ($1,$2,$3,$4)",
                &[&listing.id, &(position as i32), &image.public_id, &image.url],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, listing: &Listing) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await?;
        let tx = conn.transaction().await?;
        let updated = tx
            .execute(
                "UPDATE listings SET
                    title=$2, property_type=$3, for_whom=$4, description=$5, starting_rent=$6,
                    rent_single=$7, rent_twin=$8, rent_triple=$9, rent_four=$10, locality=$11,
                    city=$12, full_address=$13, latitude=$14, longitude=$15, total_rooms=$16,
                    available_beds=$17, amenities=$18, phone_number=$19
                 WHERE id=$1",
                &[
                    &listing.id,
                    &listing.title,
                    &listing.property_type.as_str(),
                    &listing.for_whom.as_str(),
                    &listing.description,
                    &listing.starting_rent,
                    &listing.room_types.single,
                    &listing.room_types.twin,
                    &listing.room_types.triple,
                    &listing.room_types.four_sharing,
                    &listing.locality,
                    &listing.city,
                    &listing.full_address,
                    &listing.latitude,
                    &listing.longitude,
                    &listing.total_rooms,
                    &listing.available_beds,
                    &listing.amenities,
                    &listing.phone_number,
                ],
            )
            .await?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        tx.execute(
            "DELETE FROM listing_images WHERE listing_id = $1",
            &[&listing.id],
        )
        .await?;
        for (position, image) in listing.images.iter().enumerate() {
            tx.execute(
                "INSERT INTO listing_images (listing_id, position, public_id, url) VALUES ($1,$2,$3,$4)",
                &[&listing.id, &(position as i32), &image.public_id, &image.url],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Listing, RepositoryError> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {LISTING_COLS} FROM listings WHERE id = $1"),
                &[&id],
            )
            .await?;
        match row {
            Some(row) => {
                let mut listing = listing_from_row(&row);
                listing.images = self.load_images(&conn, id).await?;
                Ok(listing)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        let deleted = conn
            .execute("DELETE FROM listings WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Listing>, RepositoryError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                &format!("SELECT {LISTING_COLS} FROM listings ORDER BY created_at DESC"),
                &[],
            )
            .await?;
        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut listing = listing_from_row(row);
            listing.images = self.load_images(&conn, listing.id).await?;
            listings.push(listing);
        }
        Ok(listings)
    }

    async fn count(&self, filter: &ListingFilter) -> Result<i64, RepositoryError> {
        let conn = self.pool.get().await?;
        let search = ListingSearch::build(filter);
        let params = bind_params(&search.params);
        let row = conn
            .query_one(
                &format!("SELECT COUNT(*) FROM listings{}", search.where_clause),
                &params,
            )
            .await?;
        Ok(row.get(0))
    }

    async fn search_page(
        &self,
        filter: &ListingFilter,
        page: Page,
    ) -> Result<Vec<Listing>, RepositoryError> {
        let conn = self.pool.get().await?;
        let search = ListingSearch::build(filter);
        let params = bind_params(&search.params);
        let sql = format!(
            "SELECT {LISTING_COLS} FROM listings{}{} LIMIT {} OFFSET {}",
            search.where_clause,
            search.order_clause,
            page.limit(),
            page.offset(),
        );
        let rows = conn.query(&sql, &params).await?;
        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut listing = listing_from_row(row);
            listing.images = self.load_images(&conn, listing.id).await?;
            listings.push(listing);
        }
        Ok(listings)
    }

    async fn decrement_available_beds(&self, id: Uuid, count: i32) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        let updated = conn
            .execute(
                "UPDATE listings SET available_beds = GREATEST(available_beds - $2, 0) WHERE id = $1",
                &[&id, &count],
            )
            .await?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn upsert_review(&self, listing_id: Uuid, review: &Review) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        conn.execute(
            "INSERT INTO reviews (listing_id, user_id, name, rating, comment)
             VALUES ($1,$2,$3,$4,$5)
             ON CONFLICT (listing_id, user_id)
             DO UPDATE SET name = EXCLUDED.name, rating = EXCLUDED.rating, comment = EXCLUDED.comment",
            &[
                &listing_id,
                &review.user,
                &review.name,
                &review.rating,
                &review.comment,
            ],
        )
        .await?;
        Ok(())
    }

    async fn reviews(&self, listing_id: Uuid) -> Result<Vec<Review>, RepositoryError> {
        let conn = self.pool.get().await?;
        let rows = conn
            .query(
                "SELECT user_id, name, rating, comment FROM reviews WHERE listing_id = $1",
                &[&listing_id],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|r| Review {
                user: r.get("user_id"),
                name: r.get("name"),
                rating: r.get("rating"),
                comment: r.get("comment"),
            })
            .collect())
    }

    async fn delete_review(&self, listing_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError> {
        let conn = self.pool.get().await?;
        let deleted = conn
            .execute(
                "DELETE FROM reviews WHERE listing_id = $1 AND user_id = $2",
                &[&listing_id, &user_id],
            )
            .await?;
        if deleted == 0 {
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
        let conn = self.pool.get().await?;
        let updated = conn
            .execute(
                "UPDATE listings SET average_rating = $2, review_count = $3 WHERE id = $1",
                &[&listing_id, &average_rating, &review_count],
            )
            .await?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn bind_params(params: &[SearchParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| match p {
            SearchParam::Text(s) => s as &(dyn ToSql + Sync),
            SearchParam::Int(i) => i as &(dyn ToSql + Sync),
        })
        .collect()
}
