use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum RoomType {
        Single => "single",
        Double => "double",
        Shared => "shared",
    }
    default = Single;
}

text_enum! {
    pub enum RoomStatus {
        Available => "available",
        Occupied => "occupied",
        Maintenance => "maintenance",
    }
    default = Available;
}

impl RoomStatus {
    /// Status implied by an occupancy count. Maintenance is a manual
    /// state and survives occupancy changes.
    pub fn for_occupancy(current: RoomStatus, occupancy: i64, capacity: i64) -> RoomStatus {
        match current {
            RoomStatus::Maintenance => RoomStatus::Maintenance,
            _ if occupancy >= capacity => RoomStatus::Occupied,
            _ => RoomStatus::Available,
        }
    }
}

/// Room is a rentable unit inside a hostel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub property_id: Option<i64>,
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub rent: f64,
    pub capacity: i64,
    pub occupancy: i64,
    pub status: RoomStatus,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub number: String,
    #[serde(default, rename = "type")]
    pub room_type: RoomType,
    pub rent: f64,
    #[serde(default = "default_capacity")]
    pub capacity: i64,
    #[serde(default)]
    pub status: RoomStatus,
}

fn default_capacity() -> i64 {
    1
}

/// Partial room update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoomRequest {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default, rename = "type")]
    pub room_type: Option<RoomType>,
    #[serde(default)]
    pub rent: Option<f64>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub status: Option<RoomStatus>,
    #[serde(default)]
    pub occupancy: Option<i64>,
}

/// List filters for rooms; "all" or absent disables a filter
#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub search: Option<String>,
    pub status: Option<RoomStatus>,
    pub room_type: Option<RoomType>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomList {
    pub rooms: Vec<Room>,
    #[serde(flatten)]
    pub page: super::PageMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OccupancyTotals {
    pub total: i64,
    pub capacity: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStats {
    pub total: i64,
    pub available: i64,
    pub occupied: i64,
    pub maintenance: i64,
    pub by_type: Vec<TypeCount>,
    pub occupancy: OccupancyTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_occupancy() {
        assert_eq!(RoomStatus::for_occupancy(RoomStatus::Available, 2, 2), RoomStatus::Occupied);
        assert_eq!(RoomStatus::for_occupancy(RoomStatus::Occupied, 1, 2), RoomStatus::Available);
        assert_eq!(RoomStatus::for_occupancy(RoomStatus::Maintenance, 2, 2), RoomStatus::Maintenance);
    }

    #[test]
    fn test_create_room_defaults() {
        let req: CreateRoomRequest = serde_json::from_str(r#"{"number":"101","rent":5000}"#).unwrap();
        assert_eq!(req.capacity, 1);
        assert_eq!(req.room_type, RoomType::Single);
        assert_eq!(req.status, RoomStatus::Available);
    }
}
