use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::auth::AuthGuest;
use crate::bookings::dto::{BookingListItem, BookingResponse, CreateBookingRequest, Pagination};
use crate::bookings::services;
use crate::error::ApiError;
use crate::state::AppState;

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id/cancel", post(cancel_booking))
}

#[instrument(skip(state, payload))]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthGuest(guest_id): AuthGuest,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let booking = services::create_booking(
        &state,
        guest_id,
        payload.room_id,
        payload.check_in,
        payload.check_out,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip(state))]
pub async fn list_bookings(
    State(state): State<AppState>,
    AuthGuest(guest_id): AuthGuest,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<BookingListItem>>, ApiError> {
    let p = p.clamp();
    let items = services::list_bookings(&state, guest_id, p.limit, p.offset).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    AuthGuest(guest_id): AuthGuest,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    services::cancel_booking(&state, guest_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
