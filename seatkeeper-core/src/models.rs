use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Reservation status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Upcoming,
    Attended,
    Archived,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Upcoming => "UPCOMING",
            ReservationStatus::Attended => "ATTENDED",
            ReservationStatus::Archived => "ARCHIVED",
        }
    }

    /// Upcoming and attended reservations still hold seats on their table.
    pub fn holds_seats(&self) -> bool {
        !matches!(self, ReservationStatus::Archived)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPCOMING" => Ok(ReservationStatus::Upcoming),
            "ATTENDED" => Ok(ReservationStatus::Attended),
            "ARCHIVED" => Ok(ReservationStatus::Archived),
            other => Err(format!("unknown reservation status {}", other)),
        }
    }
}

/// Seat bookkeeping for one table.
///
/// `capacity == booked_seats + available_seats` holds at every commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    pub id: Uuid,
    pub capacity: i32,
    pub booked_seats: i32,
    pub available_seats: i32,
}

impl Table {
    pub fn new(capacity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            capacity,
            booked_seats: 0,
            available_seats: capacity,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.capacity == self.booked_seats + self.available_seats && self.available_seats >= 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    pub table_id: Uuid,
    pub name: String,
    pub accompanying_guests: i32,
    pub status: ReservationStatus,
    #[serde(rename = "time_arrived", skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn new(table_id: Uuid, name: String, accompanying_guests: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            table_id,
            name,
            accompanying_guests,
            status: ReservationStatus::Upcoming,
            arrival_time: None,
        }
    }
}

/// The slice of a non-archived reservation that seat flows work from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveReservation {
    pub id: Uuid,
    pub table_id: Uuid,
    pub accompanying_guests: i32,
    pub status: ReservationStatus,
    pub arrival_time: Option<DateTime<Utc>>,
}

impl From<&Reservation> for ActiveReservation {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id,
            table_id: r.table_id,
            accompanying_guests: r.accompanying_guests,
            status: r.status,
            arrival_time: r.arrival_time,
        }
    }
}

/// Row of the full guest list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestListEntry {
    pub table_id: Uuid,
    pub name: String,
    pub accompanying_guests: i32,
}

/// Row of the arrived-guests list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArrivedGuest {
    pub name: String,
    pub accompanying_guests: i32,
    pub time_arrived: Option<DateTime<Utc>>,
}
