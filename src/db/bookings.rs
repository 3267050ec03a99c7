//! Sentencias SQL sobre la tabla `bookings`.
//!
//! Las transiciones de estado son actualizaciones condicionales: el predicado
//! incluye el estado previo esperado y el llamador decide según las filas
//! afectadas.

use chrono::NaiveDate;

use super::models::{Booking, BookingId, BookingRow, GuestId};
use super::SqliteRepo;
use crate::api::middleware::ErrorLogExt;
use crate::api::{AppError, AppResult};
use crate::lifecycle::BookingDraft;

const SELECT_COLUMNS: &str = "SELECT id, full_name, email, phone_number, check_in_date, check_out_date, nights, num_guests, room_type, total_amount, submission_time, status, book_out_time, guest_id FROM bookings";

const ACTIVE_ALL: &str = "WHERE status = 'Active' ORDER BY submission_time DESC, id DESC";
const ACTIVE_FROM: &str = "WHERE status = 'Active' AND check_in_date >= ? ORDER BY submission_time DESC, id DESC";
const ACTIVE_UNTIL: &str = "WHERE status = 'Active' AND check_out_date <= ? ORDER BY submission_time DESC, id DESC";
const ACTIVE_BETWEEN: &str = "WHERE status = 'Active' AND check_in_date >= ? AND check_out_date <= ? ORDER BY submission_time DESC, id DESC";

fn select(clause: &str) -> String {
    format!("{} {}", SELECT_COLUMNS, clause)
}

fn into_bookings(rows: Vec<BookingRow>) -> AppResult<Vec<Booking>> {
    rows.into_iter().map(Booking::try_from).collect()
}

impl SqliteRepo {
    pub async fn insert_booking(
        &self,
        draft: &BookingDraft,
        guest_id: Option<GuestId>,
    ) -> AppResult<Booking> {
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (full_name, email, phone_number, check_in_date, check_out_date, nights, num_guests, room_type, total_amount, submission_time, status, guest_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'Active', ?)
            "#,
        )
        .bind(&draft.full_name)
        .bind(&draft.email)
        .bind(&draft.phone_number)
        .bind(draft.check_in_date)
        .bind(draft.check_out_date)
        .bind(draft.nights)
        .bind(draft.num_guests)
        .bind(&draft.room_type)
        .bind(draft.total_amount)
        .bind(SqliteRepo::current_timestamp())
        .bind(guest_id)
        .execute(&self.pool)
        .await
        .log_error_context("inserting booking")
        .map_err(|e| AppError::database("insert_booking", e))?;

        let id = result.last_insert_rowid();
        self.find_booking(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("booking {} vanished after insert", id)))
    }

    pub async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&select("WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database("find_booking", e))?;

        row.map(Booking::try_from).transpose()
    }

    pub async fn find_guest_booking(
        &self,
        id: BookingId,
        guest_id: GuestId,
    ) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&select("WHERE id = ? AND guest_id = ?"))
            .bind(id)
            .bind(guest_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database("find_guest_booking", e))?;

        row.map(Booking::try_from).transpose()
    }

    /// Active → Booked Out. Con `guest_id` solo afecta a reservas de ese huésped.
    pub async fn mark_booked_out(
        &self,
        id: BookingId,
        guest_id: Option<GuestId>,
    ) -> AppResult<u64> {
        let now = SqliteRepo::current_timestamp();
        let query = match guest_id {
            Some(guest_id) => sqlx::query(
                "UPDATE bookings SET status = 'Booked Out', book_out_time = ? WHERE id = ? AND guest_id = ? AND status = 'Active'",
            )
            .bind(now)
            .bind(id)
            .bind(guest_id),
            None => sqlx::query(
                "UPDATE bookings SET status = 'Booked Out', book_out_time = ? WHERE id = ? AND status = 'Active'",
            )
            .bind(now)
            .bind(id),
        };

        let result = query
            .execute(&self.pool)
            .await
            .log_error_context("booking out")
            .map_err(|e| AppError::database("mark_booked_out", e))?;

        Ok(result.rows_affected())
    }

    /// {Active, Booked Out} → Cancelled
    pub async fn mark_cancelled(&self, id: BookingId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'Cancelled' WHERE id = ? AND status IN ('Active', 'Booked Out')",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .log_error_context("cancelling booking")
        .map_err(|e| AppError::database("mark_cancelled", e))?;

        Ok(result.rows_affected())
    }

    /// Cancelación por parte del huésped: borra la fila
    pub async fn delete_guest_booking(&self, id: BookingId, guest_id: GuestId) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM bookings WHERE id = ? AND guest_id = ? AND status = 'Active'",
        )
        .bind(id)
        .bind(guest_id)
        .execute(&self.pool)
        .await
        .log_error_context("deleting guest booking")
        .map_err(|e| AppError::database("delete_guest_booking", e))?;

        Ok(result.rows_affected())
    }

    /// Borra todas las reservas y reinicia la secuencia de ids
    pub async fn delete_all_bookings(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM bookings")
            .execute(&self.pool)
            .await
            .log_error_context("clearing bookings")
            .map_err(|e| AppError::database("delete_all_bookings", e))?;

        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'bookings'")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database("reset_booking_sequence", e))?;

        Ok(result.rows_affected())
    }

    pub async fn list_active_bookings(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<Vec<Booking>> {
        let rows = match (start_date, end_date) {
            (None, None) => {
                sqlx::query_as::<_, BookingRow>(&select(ACTIVE_ALL))
                    .fetch_all(&self.pool)
                    .await
            }
            (Some(start), None) => {
                sqlx::query_as::<_, BookingRow>(&select(ACTIVE_FROM))
                    .bind(start)
                    .fetch_all(&self.pool)
                    .await
            }
            (None, Some(end)) => {
                sqlx::query_as::<_, BookingRow>(&select(ACTIVE_UNTIL))
                    .bind(end)
                    .fetch_all(&self.pool)
                    .await
            }
            (Some(start), Some(end)) => {
                sqlx::query_as::<_, BookingRow>(&select(ACTIVE_BETWEEN))
                    .bind(start)
                    .bind(end)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .log_error_context("listing active bookings")
        .map_err(|e| AppError::database("list_active_bookings", e))?;

        into_bookings(rows)
    }

    pub async fn list_booked_out(&self) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&select(
            "WHERE status = 'Booked Out' ORDER BY book_out_time DESC, id DESC",
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database("list_booked_out", e))?;

        into_bookings(rows)
    }

    pub async fn list_guest_bookings(&self, guest_id: GuestId) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&select(
            "WHERE guest_id = ? ORDER BY submission_time DESC, id DESC",
        ))
        .bind(guest_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database("list_guest_bookings", e))?;

        into_bookings(rows)
    }

    pub async fn count_bookings(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database("count_bookings", e))
    }
}
