use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

/// Query string for the availability search. `capacity` absent or 0 means
/// no capacity filter.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: Date,
    pub check_out: Date,
    #[serde(default)]
    pub capacity: Option<i32>,
}

/// One concrete free room inside a group.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: i32,
    pub room_number: String,
}

/// All currently-free rooms sharing one room type. Groups are ordered by
/// ascending base price, rooms by room number.
#[derive(Debug, Clone, Serialize)]
pub struct RoomGroup {
    pub type_id: i32,
    pub type_name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub capacity: i32,
    pub rooms: Vec<RoomSummary>,
}
