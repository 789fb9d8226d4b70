//! Listing catalogue service: search/filter/sort/pagination, owner CRUD and
//! reviews. Inventory mutation lives in the booking lifecycle, not here.

use async_trait::async_trait;
use chrono::Utc;
use model::{
    Listing, Review, Role,
    request::{CreateListingRequest, CreateReviewRequest, ListingFilter, UpdateListingRequest},
};
use repository::{ListingsRepository, search::Page};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::policy::{Actor, authorize};
use crate::ServiceError;

/// One page of search results plus the pagination envelope the clients
/// render from.
#[derive(Debug)]
pub struct SearchResults {
    pub properties: Vec<Listing>,
    pub property_count: i64,
    pub results_per_page: u32,
    pub current_page: u32,
    pub total_pages: i64,
}

/// Business operations of the listing catalogue.
#[async_trait]
pub trait ListingService: Send + Sync {
    async fn search(&self, filter: ListingFilter) -> Result<SearchResults, ServiceError>;
    async fn get_listing(&self, id: Uuid) -> Result<Listing, ServiceError>;
    async fn create_listing(
        &self,
        actor: &Actor,
        req: CreateListingRequest,
    ) -> Result<Listing, ServiceError>;
    async fn update_listing(
        &self,
        actor: &Actor,
        id: Uuid,
        req: UpdateListingRequest,
    ) -> Result<Listing, ServiceError>;
    async fn delete_listing(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError>;

    /// Admin view of the whole catalogue, unpaginated.
    async fn admin_listings(&self, actor: &Actor) -> Result<Vec<Listing>, ServiceError>;

    /// Creates or replaces the actor's review; rating aggregates are
    /// recomputed from the stored review set afterwards.
    async fn submit_review(
        &self,
        actor: &Actor,
        req: CreateReviewRequest,
    ) -> Result<Listing, ServiceError>;
    async fn reviews(&self, listing_id: Uuid) -> Result<Vec<Review>, ServiceError>;
    async fn delete_review(
        &self,
        actor: &Actor,
        listing_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError>;
}

/// Implementation of [`ListingService`] over an injected repository.
pub struct ListingCatalogService<L> {
    listings: L,
    results_per_page: u32,
}

impl<L: ListingsRepository> ListingCatalogService<L> {
    pub fn new(listings: L, results_per_page: u32) -> Self {
        Self {
            listings,
            results_per_page,
        }
    }

    /// Re-derives `averageRating` / `reviewCount` from the review set and
    /// persists them. The aggregates are never hand-edited.
    async fn refresh_rating(&self, listing_id: Uuid) -> Result<(), ServiceError> {
        let reviews = self
            .listings
            .reviews(listing_id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;
        let (average, count) = Review::aggregate(&reviews);
        self.listings
            .update_rating(listing_id, average, count)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))
    }
}

#[async_trait]
impl<L: ListingsRepository> ListingService for ListingCatalogService<L> {
    #[instrument(skip(self))]
    async fn search(&self, filter: ListingFilter) -> Result<SearchResults, ServiceError> {
        let page = Page::new(filter.page, self.results_per_page);
        let count = self
            .listings
            .count(&filter)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;
        let total_pages = Page::total_pages(count, self.results_per_page);

        // Requesting past the end of a non-empty result set is an error; a
        // page over zero results is a valid empty page.
        if i64::from(page.number) > total_pages && count > 0 {
            return Err(ServiceError::NotFound("Page not found"));
        }

        let properties = self
            .listings
            .search_page(&filter, page)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;

        Ok(SearchResults {
            properties,
            property_count: count,
            results_per_page: self.results_per_page,
            current_page: page.number,
            total_pages,
        })
    }

    async fn get_listing(&self, id: Uuid) -> Result<Listing, ServiceError> {
        self.listings
            .get_by_id(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))
    }

    #[instrument(skip(self, req), fields(owner = %actor.id))]
    async fn create_listing(
        &self,
        actor: &Actor,
        req: CreateListingRequest,
    ) -> Result<Listing, ServiceError> {
        authorize(actor.role, &[Role::Owner, Role::Admin])?;

        if req.title.trim().is_empty() || req.city.trim().is_empty() || req.locality.trim().is_empty()
        {
            return Err(ServiceError::Validation(
                "Required fields (Title, City, Locality) missing.".into(),
            ));
        }

        let listing = Listing {
            id: Uuid::new_v4(),
            title: req.title,
            property_type: req.property_type,
            for_whom: req.for_whom,
            description: req.description,
            starting_rent: req.starting_rent,
            room_types: req.room_types,
            locality: req.locality,
            city: req.city,
            full_address: req.full_address,
            latitude: req.latitude,
            longitude: req.longitude,
            images: req.images,
            total_rooms: req.total_rooms,
            available_beds: req.available_beds,
            amenities: req.amenities,
            owner: actor.id,
            phone_number: req.phone_number,
            average_rating: 0.0,
            review_count: 0,
            created_at: Utc::now(),
        };

        self.listings
            .insert(&listing)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;
        info!(listing = %listing.id, "listing created");
        Ok(listing)
    }

    #[instrument(skip(self, req))]
    async fn update_listing(
        &self,
        actor: &Actor,
        id: Uuid,
        req: UpdateListingRequest,
    ) -> Result<Listing, ServiceError> {
        let mut listing = self
            .listings
            .get_by_id(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;

        if listing.owner != actor.id && !actor.is_admin() {
            return Err(ServiceError::Forbidden);
        }

        if let Some(title) = req.title {
            listing.title = title;
        }
        if let Some(property_type) = req.property_type {
            listing.property_type = property_type;
        }
        if let Some(for_whom) = req.for_whom {
            listing.for_whom = for_whom;
        }
        if let Some(description) = req.description {
            listing.description = description;
        }
        if let Some(starting_rent) = req.starting_rent {
            listing.starting_rent = starting_rent;
        }
        if let Some(room_types) = req.room_types {
            listing.room_types = room_types;
        }
        if let Some(locality) = req.locality {
            listing.locality = locality;
        }
        if let Some(city) = req.city {
            listing.city = city;
        }
        if let Some(full_address) = req.full_address {
            listing.full_address = full_address;
        }
        if req.latitude.is_some() {
            listing.latitude = req.latitude;
        }
        if req.longitude.is_some() {
            listing.longitude = req.longitude;
        }
        if let Some(images) = req.images {
            listing.images = images;
        }
        if let Some(total_rooms) = req.total_rooms {
            listing.total_rooms = total_rooms;
        }
        if let Some(available_beds) = req.available_beds {
            listing.available_beds = available_beds;
        }
        if let Some(amenities) = req.amenities {
            listing.amenities = amenities;
        }
        if let Some(phone_number) = req.phone_number {
            listing.phone_number = phone_number;
        }

        self.listings
            .update(&listing)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;
        Ok(listing)
    }

    #[instrument(skip(self))]
    async fn delete_listing(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        let listing = self
            .listings
            .get_by_id(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;

        if listing.owner != actor.id && !actor.is_admin() {
            return Err(ServiceError::Forbidden);
        }

        self.listings
            .delete(id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;
        info!(listing = %id, "listing deleted");
        Ok(())
    }

    async fn admin_listings(&self, actor: &Actor) -> Result<Vec<Listing>, ServiceError> {
        authorize(actor.role, &[Role::Admin])?;
        self.listings
            .list_all()
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))
    }

    #[instrument(skip(self, req), fields(user = %actor.id))]
    async fn submit_review(
        &self,
        actor: &Actor,
        req: CreateReviewRequest,
    ) -> Result<Listing, ServiceError> {
        if !(1..=5).contains(&req.rating) {
            return Err(ServiceError::Validation(
                "Rating must be between 1 and 5".into(),
            ));
        }

        // Make sure the listing still exists before touching reviews.
        self.listings
            .get_by_id(req.property_id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;

        let review = Review {
            user: actor.id,
            name: actor.name.clone(),
            rating: req.rating,
            comment: req.comment,
        };
        self.listings
            .upsert_review(req.property_id, &review)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;

        self.refresh_rating(req.property_id).await?;

        self.listings
            .get_by_id(req.property_id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))
    }

    async fn reviews(&self, listing_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        // Surface a clean 404 for an unknown listing rather than an empty
        // review list.
        self.listings
            .get_by_id(listing_id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))?;
        self.listings
            .reviews(listing_id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Property not found"))
    }

    #[instrument(skip(self))]
    async fn delete_review(
        &self,
        actor: &Actor,
        listing_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        if actor.id != user_id && !actor.is_admin() {
            return Err(ServiceError::Forbidden);
        }

        self.listings
            .delete_review(listing_id, user_id)
            .await
            .map_err(|e| ServiceError::from_repo(e, "Review not found"))?;
        self.refresh_rating(listing_id).await
    }
}
