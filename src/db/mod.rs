// src/db/mod.rs
pub mod accounts;
pub mod bookings;
pub mod models;
pub mod sessions;
pub mod sqlite;

pub use models::{AdminAccount, Booking, BookingId, BookingStatus, GuestAccount, GuestId};
pub use sessions::SqliteSessionStore;
pub use sqlite::SqliteRepo;
