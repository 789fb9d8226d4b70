//! Booking and payment endpoints.
//!
//! All response bodies carry `"success": true`; failures go through
//! [`crate::error::ApiError`] and carry `"success": false`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use model::request::{
    CreateBookingRequest, PaymentIntentRequest, UpdateStatusRequest, VerifyPaymentRequest,
};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiResult;

pub async fn create_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking = state.bookings.create_booking(&actor, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "booking": booking })),
    ))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let bookings = state.bookings.my_bookings(&actor).await?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}

pub async fn get_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let booking = state.bookings.get_booking(&actor, id).await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

/// Mints a gateway order for the checkout widget. The client pays against
/// the returned order id and comes back through [`verify_payment`].
pub async fn process_payment(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Json(req): Json<PaymentIntentRequest>,
) -> ApiResult<impl IntoResponse> {
    let order = state.bookings.request_payment_intent(req).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// Public checkout key for the payment widget.
pub async fn payment_key(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "key": state.gateway_key_id }))
}

/// Gateway redirect target; authenticated by signature, not by session.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking = state.bookings.verify_payment(req).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Payment verified successfully",
        "booking": booking,
    })))
}

pub async fn admin_bookings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let ledger = state.bookings.list_bookings(&actor).await?;
    Ok(Json(json!({
        "success": true,
        "bookingsCount": ledger.bookings.len(),
        "totalRevenue": ledger.total_revenue,
        "bookings": ledger.bookings,
    })))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking = state
        .bookings
        .update_booking_status(&actor, id, req.status)
        .await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.bookings.delete_booking(&actor, id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Booking deleted successfully",
    })))
}
