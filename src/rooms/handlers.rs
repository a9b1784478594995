use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::rooms::dto::{AvailabilityQuery, RoomGroup};
use crate::rooms::services;
use crate::state::AppState;

pub fn room_routes() -> Router<AppState> {
    Router::new().route("/rooms/available", get(search_available))
}

/// GET /rooms/available?check_in=2024-06-01&check_out=2024-06-03&capacity=2
#[instrument(skip(state))]
pub async fn search_available(
    State(state): State<AppState>,
    Query(q): Query<AvailabilityQuery>,
) -> Result<Json<Vec<RoomGroup>>, ApiError> {
    let groups = services::find_available(&state, q.check_in, q.check_out, q.capacity).await?;
    Ok(Json(groups))
}
