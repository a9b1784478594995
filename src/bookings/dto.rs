use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::bookings::repo::ReservationStatus;

/// Request body for creating a booking. The price is never part of the
/// request; it is derived server-side from the room's current base price.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: i32,
    pub check_in: Date,
    pub check_out: Date,
}

/// Response for a freshly created booking.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub reservation_id: i32,
    pub room_id: i32,
    pub room_number: String,
    pub check_in: Date,
    pub check_out: Date,
    pub nights: i64,
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub created_at: OffsetDateTime,
}

/// One entry in a guest's booking history, joined with room and type info
/// for display.
#[derive(Debug, Serialize)]
pub struct BookingListItem {
    pub reservation_id: i32,
    pub room_number: String,
    pub type_name: String,
    pub check_in: Date,
    pub check_out: Date,
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

const MAX_LIMIT: i64 = 100;

impl Pagination {
    /// Postgres rejects negative LIMIT/OFFSET outright; clamp a malformed
    /// page instead of surfacing that as a store error.
    pub fn clamp(self) -> Self {
        Self {
            limit: self.limit.clamp(0, MAX_LIMIT),
            offset: self.offset.max(0),
        }
    }
}
