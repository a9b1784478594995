use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::bookings::dto::{BookingListItem, BookingResponse};
use crate::bookings::repo::{self, BookingOutcome};
use crate::error::ApiError;
use crate::rooms::services::validate_window;
use crate::state::AppState;

/// SQLSTATE for an exclusion constraint violation. Raised when two
/// transactions race past the row lock (e.g. bookings created outside this
/// code path); it means the same thing as a lost overlap check.
const EXCLUSION_VIOLATION: &str = "23P01";

pub(crate) fn is_overlap_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION)
    )
}

/// Create a reservation for the guest, re-deriving the price from the
/// store. Fails with Conflict when the room was taken between search and
/// commit; the caller should re-query availability rather than retry.
pub async fn create_booking(
    state: &AppState,
    guest_id: i32,
    room_id: i32,
    check_in: Date,
    check_out: Date,
) -> Result<BookingResponse, ApiError> {
    let today = OffsetDateTime::now_utc().date();
    validate_window(check_in, check_out, today)?;

    let outcome = repo::book(&state.db, guest_id, room_id, check_in, check_out)
        .await
        .map_err(|e| {
            if is_overlap_violation(&e) {
                warn!(guest_id, room_id, "booking lost race to exclusion constraint");
                ApiError::Conflict("Room is no longer available for these dates".into())
            } else {
                ApiError::Store(e)
            }
        })?;

    match outcome {
        BookingOutcome::Created(created) => {
            let r = created.reservation;
            info!(
                guest_id,
                room_id,
                reservation_id = r.reservation_id,
                total = %r.total_price,
                "booking created"
            );
            Ok(BookingResponse {
                reservation_id: r.reservation_id,
                room_id: r.room_id,
                room_number: created.room_number,
                check_in: r.check_in_date,
                check_out: r.check_out_date,
                nights: repo::nights_between(r.check_in_date, r.check_out_date),
                total_price: r.total_price,
                status: r.status,
                created_at: r.created_at,
            })
        }
        BookingOutcome::RoomMissing => Err(ApiError::NotFound("Room not found".into())),
        BookingOutcome::Overlap => {
            warn!(guest_id, room_id, "room already reserved for requested window");
            Err(ApiError::Conflict(
                "Room is no longer available for these dates".into(),
            ))
        }
    }
}

/// The guest's booking history, newest first.
pub async fn list_bookings(
    state: &AppState,
    guest_id: i32,
    limit: i64,
    offset: i64,
) -> Result<Vec<BookingListItem>, ApiError> {
    let rows = repo::list_for_guest(&state.db, guest_id, limit, offset).await?;
    Ok(rows
        .into_iter()
        .map(|row| BookingListItem {
            reservation_id: row.reservation_id,
            room_number: row.room_number,
            type_name: row.type_name,
            check_in: row.check_in_date,
            check_out: row.check_out_date,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
        })
        .collect())
}

/// Soft-cancel one of the guest's reservations. A reservation that does
/// not exist and one owned by another guest produce the same NotFound, so
/// nothing leaks about other guests' bookings. Cancelling twice succeeds.
pub async fn cancel_booking(
    state: &AppState,
    guest_id: i32,
    reservation_id: i32,
) -> Result<(), ApiError> {
    match repo::cancel_for_guest(&state.db, reservation_id, guest_id).await? {
        Some(_) => {
            info!(guest_id, reservation_id, "reservation cancelled");
            Ok(())
        }
        None => {
            warn!(guest_id, reservation_id, "cancel miss (absent or foreign)");
            Err(ApiError::NotFound("Reservation not found".into()))
        }
    }
}
