//! Listing catalogue and review endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use model::request::{
    CreateListingRequest, CreateReviewRequest, ListingFilter, UpdateListingRequest,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiResult;

pub async fn search(
    State(state): State<AppState>,
    Query(filter): Query<ListingFilter>,
) -> ApiResult<impl IntoResponse> {
    let results = state.listings.search(filter).await?;
    Ok(Json(json!({
        "success": true,
        "propertyCount": results.property_count,
        "resultsPerPage": results.results_per_page,
        "currentPage": results.current_page,
        "totalPages": results.total_pages,
        "properties": results.properties,
    })))
}

pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let property = state.listings.get_listing(id).await?;
    Ok(Json(json!({ "success": true, "property": property })))
}

pub async fn create_listing(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(req): Json<CreateListingRequest>,
) -> ApiResult<impl IntoResponse> {
    let property = state.listings.create_listing(&actor, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "property": property })),
    ))
}

pub async fn update_listing(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateListingRequest>,
) -> ApiResult<impl IntoResponse> {
    let property = state.listings.update_listing(&actor, id, req).await?;
    Ok(Json(json!({ "success": true, "property": property })))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.listings.delete_listing(&actor, id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Property deleted successfully",
    })))
}

pub async fn admin_listings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let properties = state.listings.admin_listings(&actor).await?;
    Ok(Json(json!({ "success": true, "properties": properties })))
}

pub async fn submit_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let property = state.listings.submit_review(&actor, req).await?;
    Ok(Json(json!({ "success": true, "property": property })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
    pub id: Uuid,
}

pub async fn get_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> ApiResult<impl IntoResponse> {
    let reviews = state.listings.reviews(query.id).await?;
    Ok(Json(json!({ "success": true, "reviews": reviews })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReviewQuery {
    pub id: Uuid,
    pub user_id: Uuid,
}

pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<DeleteReviewQuery>,
) -> ApiResult<impl IntoResponse> {
    state
        .listings
        .delete_review(&actor, query.id, query.user_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}
