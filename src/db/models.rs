use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::AppError;

pub type BookingId = i64;
pub type GuestId = i64;
pub type AdminId = i64;

/// Estado de una reserva en la tabla `bookings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Active,
    #[serde(rename = "Booked Out")]
    BookedOut,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::BookedOut => "Booked Out",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Booked Out" => Ok(Self::BookedOut),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::Internal(format!("unexpected booking status '{}'", other))),
        }
    }
}

/// Reserva persistida
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: BookingId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub nights: i64,
    pub num_guests: i64,
    pub room_type: String,
    pub total_amount: f64,
    pub submission_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub book_out_time: Option<DateTime<Utc>>,
    pub guest_id: Option<GuestId>,
}

/// Fila tal como sale de SQLite; el estado llega como texto
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub nights: i64,
    pub num_guests: i64,
    pub room_type: String,
    pub total_amount: f64,
    pub submission_time: DateTime<Utc>,
    pub status: String,
    pub book_out_time: Option<DateTime<Utc>>,
    pub guest_id: Option<i64>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone_number: row.phone_number,
            check_in_date: row.check_in_date,
            check_out_date: row.check_out_date,
            nights: row.nights,
            num_guests: row.num_guests,
            room_type: row.room_type,
            total_amount: row.total_amount,
            submission_time: row.submission_time,
            status: row.status.parse()?,
            book_out_time: row.book_out_time,
            guest_id: row.guest_id,
        })
    }
}

/// Cuenta de huésped
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GuestAccount {
    pub id: GuestId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Cuenta de administrador
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminAccount {
    pub id: AdminId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_matches_stored_values() {
        for status in [BookingStatus::Active, BookingStatus::BookedOut, BookingStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("Pending".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn status_serializes_like_the_table() {
        let json = serde_json::to_string(&BookingStatus::BookedOut).unwrap();
        assert_eq!(json, "\"Booked Out\"");
    }
}
