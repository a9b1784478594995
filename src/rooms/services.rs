use time::{Date, OffsetDateTime};

use crate::error::ApiError;
use crate::rooms::dto::{RoomGroup, RoomSummary};
use crate::rooms::repo::{self, AvailableRoomRow};
use crate::state::AppState;

/// Validate a requested stay window against a reference "today".
/// Calendar-date comparison only; time of day never enters into it.
pub fn validate_window(check_in: Date, check_out: Date, today: Date) -> Result<(), ApiError> {
    if check_in >= check_out {
        return Err(ApiError::Validation(
            "check_out must be after check_in".into(),
        ));
    }
    if check_in < today {
        return Err(ApiError::Validation("check_in must not be in the past".into()));
    }
    Ok(())
}

/// Fold the ordered row stream into per-type groups. Rows arrive sorted by
/// base price, then type, then room number, so a group is a consecutive run
/// of one type_id.
pub fn group_by_type(rows: Vec<AvailableRoomRow>) -> Vec<RoomGroup> {
    let mut groups: Vec<RoomGroup> = Vec::new();
    for row in rows {
        let room = RoomSummary {
            room_id: row.room_id,
            room_number: row.room_number,
        };
        match groups.last_mut() {
            Some(group) if group.type_id == row.type_id => group.rooms.push(room),
            _ => groups.push(RoomGroup {
                type_id: row.type_id,
                type_name: row.type_name,
                description: row.description,
                base_price: row.base_price,
                capacity: row.capacity,
                rooms: vec![room],
            }),
        }
    }
    groups
}

/// Point-in-time availability snapshot: free rooms for [check_in, check_out),
/// grouped by type. Never reserves anything.
pub async fn find_available(
    state: &AppState,
    check_in: Date,
    check_out: Date,
    min_capacity: Option<i32>,
) -> Result<Vec<RoomGroup>, ApiError> {
    let today = OffsetDateTime::now_utc().date();
    validate_window(check_in, check_out, today)?;

    let min_capacity = min_capacity.unwrap_or(0);
    if min_capacity < 0 {
        return Err(ApiError::Validation("capacity must not be negative".into()));
    }

    let rows = repo::find_available(&state.db, check_in, check_out, min_capacity).await?;
    Ok(group_by_type(rows))
}
