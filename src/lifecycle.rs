//! # Ciclo de vida de las reservas
//!
//! - Validación y tarificación de solicitudes de reserva
//! - Creación de reservas (estado `Active`)
//! - Transiciones `Active → Booked Out` y `→ Cancelled` según el actor
//! - Vaciado completo de la tabla (solo administradores)
//! - Consultas de reservas activas y resúmenes para los paneles
//!
//! Las transiciones se resuelven en SQL con actualizaciones condicionales; si
//! no se afecta ninguna fila se relee la reserva para explicar el motivo.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::{AppError, AppResult, StatusMessage};
use crate::db::models::{Booking, BookingId, BookingStatus, GuestId};
use crate::db::SqliteRepo;
use crate::session::{AdminIdentity, GuestIdentity, PendingBooking};

/// Tipos de habitación con tarifa por noche (KES)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomType {
    Standard,
    Spacious,
    MasterEnsuite,
}

impl RoomType {
    pub const ALL: [RoomType; 3] = [RoomType::Standard, RoomType::Spacious, RoomType::MasterEnsuite];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Standard Room",
            Self::Spacious => "Spacious Room",
            Self::MasterEnsuite => "Master Ensuite",
        }
    }

    pub fn nightly_rate(&self) -> f64 {
        match self {
            Self::Standard => 15500.00,
            Self::Spacious => 18500.00,
            Self::MasterEnsuite => 23500.00,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|room| room.label() == label)
    }
}

/// Tarifa por noche; un tipo desconocido no se rechaza, cuesta 0
pub fn nightly_rate(room_type: &str) -> f64 {
    RoomType::from_label(room_type)
        .map(|room| room.nightly_rate())
        .unwrap_or(0.0)
}

/// Noches y total de una estancia. La salida debe ser posterior a la entrada.
pub fn price_stay(check_in: NaiveDate, check_out: NaiveDate, room_type: &str) -> AppResult<(i64, f64)> {
    if check_out <= check_in {
        return Err(AppError::validation_field(
            "checkout",
            "Check-out date must be after check-in date.",
        ));
    }

    let nights = (check_out - check_in).num_days();
    Ok((nights, nights as f64 * nightly_rate(room_type)))
}

fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::validation_field(field, "Invalid date format, use YYYY-MM-DD."))
}

/// Formulario público de reserva
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub checkin: String,
    #[serde(default)]
    pub checkout: String,
    #[serde(default)]
    pub guests: String,
    #[serde(default, rename = "roomType")]
    pub room_type: String,
}

impl BookingRequest {
    /// Valida la solicitud y calcula los campos derivados
    pub fn validate(&self) -> AppResult<BookingDraft> {
        let fields = [
            &self.name,
            &self.email,
            &self.phone,
            &self.checkin,
            &self.checkout,
            &self.guests,
            &self.room_type,
        ];
        if fields.iter().any(|value| value.trim().is_empty()) {
            return Err(AppError::Validation(
                "All form fields are required for booking.".to_string(),
            ));
        }

        let check_in_date = parse_date("checkin", self.checkin.trim())?;
        let check_out_date = parse_date("checkout", self.checkout.trim())?;

        let room_type = self.room_type.trim().to_string();
        let (nights, total_amount) = price_stay(check_in_date, check_out_date, &room_type)?;

        let num_guests = self
            .guests
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                AppError::validation_field("guests", "Number of guests must be a positive whole number.")
            })?;

        Ok(BookingDraft {
            full_name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: self.phone.trim().to_string(),
            check_in_date,
            check_out_date,
            nights,
            num_guests,
            room_type,
            total_amount,
        })
    }
}

/// Reserva validada y tarificada, aún sin persistir
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub nights: i64,
    pub num_guests: i64,
    pub room_type: String,
    pub total_amount: f64,
}

impl BookingDraft {
    /// Sustituye los datos de contacto por los de la cuenta autenticada
    pub fn with_contact_of(mut self, guest: &GuestIdentity) -> Self {
        self.full_name = guest.full_name.clone();
        self.email = guest.email.clone();
        self.phone_number = guest.phone_number.clone();
        self
    }

    pub fn into_pending(self) -> PendingBooking {
        PendingBooking {
            name: self.full_name,
            email: self.email,
            phone: self.phone_number,
            checkin: self.check_in_date,
            checkout: self.check_out_date,
            guests: self.num_guests,
            room_type: self.room_type,
            nights: self.nights,
            total_amount: self.total_amount,
        }
    }
}

impl From<PendingBooking> for BookingDraft {
    fn from(pending: PendingBooking) -> Self {
        BookingDraft {
            full_name: pending.name,
            email: pending.email,
            phone_number: pending.phone,
            check_in_date: pending.checkin,
            check_out_date: pending.checkout,
            nights: pending.nights,
            num_guests: pending.guests,
            room_type: pending.room_type,
            total_amount: pending.total_amount,
        }
    }
}

/// Persiste una reserva en estado `Active`
pub async fn create_booking(
    repo: &SqliteRepo,
    draft: &BookingDraft,
    guest_id: Option<GuestId>,
) -> AppResult<Booking> {
    let booking = repo.insert_booking(draft, guest_id).await?;

    tracing::info!(
        booking_id = booking.id,
        guest_id = ?guest_id,
        room_type = %booking.room_type,
        nights = booking.nights,
        total_amount = booking.total_amount,
        "Booking created"
    );

    Ok(booking)
}

/// Quién pide la transición
#[derive(Debug, Clone)]
pub enum Actor {
    Admin(AdminIdentity),
    Guest(GuestIdentity),
}

impl Actor {
    fn guest_id(&self) -> Option<GuestId> {
        match self {
            Actor::Admin(_) => None,
            Actor::Guest(guest) => Some(guest.id),
        }
    }
}

/// Resultado de una transición que no es un error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Se actualizó el estado
    Applied,
    /// El huésped canceló: la fila se borró
    Removed,
    /// Ninguna fila afectada: la reserva ya estaba en el estado pedido
    Unchanged,
}

impl TransitionOutcome {
    pub fn describe(&self, booking_id: BookingId, target: BookingStatus) -> StatusMessage {
        match (self, target) {
            (Self::Applied, BookingStatus::BookedOut) => StatusMessage::success(format!(
                "Booking ID {} has been successfully booked out.",
                booking_id
            )),
            (Self::Applied | Self::Removed, _) => StatusMessage::success(format!(
                "Booking ID {} has been successfully cancelled.",
                booking_id
            )),
            (Self::Unchanged, BookingStatus::BookedOut) => StatusMessage::info(format!(
                "Booking ID {} is already booked out.",
                booking_id
            )),
            (Self::Unchanged, _) => StatusMessage::info(format!(
                "Booking ID {} was already cancelled.",
                booking_id
            )),
        }
    }
}

fn verb(target: BookingStatus) -> &'static str {
    match target {
        BookingStatus::Active => "reactivated",
        BookingStatus::BookedOut => "booked out",
        BookingStatus::Cancelled => "cancelled",
    }
}

/// Aplica una transición de estado como compare-and-swap en SQL
///
/// | Actor | Destino | Estados previos admitidos | Efecto |
/// |---|---|---|---|
/// | Admin | Booked Out | Active | `status`, `book_out_time` |
/// | Admin | Cancelled | Active, Booked Out | `status` |
/// | Guest (propietario) | Booked Out | Active | `status`, `book_out_time` |
/// | Guest (propietario) | Cancelled | Active | borra la fila |
///
/// # Errores
///
/// - `NotFound`: la reserva no existe o no pertenece al huésped
/// - `InvalidStateTransition`: el estado actual no admite el destino
/// - `Database`: fallo de SQLite
pub async fn transition(
    repo: &SqliteRepo,
    booking_id: BookingId,
    actor: &Actor,
    target: BookingStatus,
) -> AppResult<TransitionOutcome> {
    let (affected, applied) = match (actor, target) {
        (_, BookingStatus::Active) => {
            return Err(AppError::InvalidStateTransition(format!(
                "Booking ID {} cannot be reactivated.",
                booking_id
            )))
        }
        (Actor::Admin(_), BookingStatus::BookedOut) => {
            (repo.mark_booked_out(booking_id, None).await?, TransitionOutcome::Applied)
        }
        (Actor::Admin(_), BookingStatus::Cancelled) => {
            (repo.mark_cancelled(booking_id).await?, TransitionOutcome::Applied)
        }
        (Actor::Guest(guest), BookingStatus::BookedOut) => (
            repo.mark_booked_out(booking_id, Some(guest.id)).await?,
            TransitionOutcome::Applied,
        ),
        (Actor::Guest(guest), BookingStatus::Cancelled) => (
            repo.delete_guest_booking(booking_id, guest.id).await?,
            TransitionOutcome::Removed,
        ),
    };

    tracing::info!(
        booking_id,
        guest_id = ?actor.guest_id(),
        status = %target,
        affected,
        "Booking transition"
    );

    if affected > 0 {
        return Ok(applied);
    }

    let current = match actor.guest_id() {
        Some(guest_id) => repo.find_guest_booking(booking_id, guest_id).await?,
        None => repo.find_booking(booking_id).await?,
    };

    match current {
        None if actor.guest_id().is_some() => Err(AppError::NotFound(format!(
            "Booking ID {} not found or does not belong to your account.",
            booking_id
        ))),
        None => Err(AppError::NotFound(format!("Booking ID {} not found.", booking_id))),
        Some(booking) if booking.status == target => Ok(TransitionOutcome::Unchanged),
        Some(booking) => Err(AppError::InvalidStateTransition(format!(
            "Booking ID {} is {} and cannot be {}.",
            booking_id,
            booking.status,
            verb(target)
        ))),
    }
}

/// Borra todas las reservas. Irreversible.
pub async fn clear_all(repo: &SqliteRepo, admin: &AdminIdentity) -> AppResult<u64> {
    let removed = repo.delete_all_bookings().await?;
    tracing::warn!(admin = %admin.username, removed, "All bookings cleared");
    Ok(removed)
}

/// Filtro de fechas de la vista de reservas activas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveFilterQuery {
    #[serde(default, rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActiveFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ActiveFilterQuery {
    /// Cadenas vacías equivalen a filtro ausente
    pub fn parse(&self) -> AppResult<ActiveFilter> {
        let parse = |field: &str, value: &Option<String>| -> AppResult<Option<NaiveDate>> {
            match value.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(raw) => parse_date(field, raw).map(Some),
            }
        };

        Ok(ActiveFilter {
            start_date: parse("startDate", &self.start_date)?,
            end_date: parse("endDate", &self.end_date)?,
        })
    }
}

/// Reservas activas con entrada >= inicio y/o salida <= fin
pub async fn list_active_bookings(repo: &SqliteRepo, filter: ActiveFilter) -> AppResult<Vec<Booking>> {
    repo.list_active_bookings(filter.start_date, filter.end_date).await
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomOccupancy {
    pub room_type: String,
    pub bookings_count: i64,
    pub guests_count: i64,
}

/// Datos del panel de administración
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub filter: ActiveFilter,
    pub total_active_bookings: usize,
    pub total_active_revenue: f64,
    pub room_occupancy: Vec<RoomOccupancy>,
    pub active_bookings: Vec<Booking>,
    pub total_booked_out: usize,
    pub booked_out_bookings: Vec<Booking>,
}

impl DashboardSummary {
    pub fn build(filter: ActiveFilter, active: Vec<Booking>, booked_out: Vec<Booking>) -> Self {
        let mut room_occupancy: Vec<RoomOccupancy> = RoomType::ALL
            .iter()
            .map(|room| RoomOccupancy {
                room_type: room.label().to_string(),
                bookings_count: 0,
                guests_count: 0,
            })
            .collect();

        for booking in &active {
            if let Some(entry) = room_occupancy
                .iter_mut()
                .find(|entry| entry.room_type == booking.room_type)
            {
                entry.bookings_count += 1;
                entry.guests_count += booking.num_guests;
            }
        }

        DashboardSummary {
            filter,
            total_active_bookings: active.len(),
            total_active_revenue: active.iter().map(|b| b.total_amount).sum(),
            room_occupancy,
            active_bookings: active,
            total_booked_out: booked_out.len(),
            booked_out_bookings: booked_out,
        }
    }
}

pub async fn dashboard_summary(repo: &SqliteRepo, filter: ActiveFilter) -> AppResult<DashboardSummary> {
    let active = list_active_bookings(repo, filter).await?;
    let booked_out = repo.list_booked_out().await?;
    Ok(DashboardSummary::build(filter, active, booked_out))
}

/// Datos de "mis reservas" de un huésped
#[derive(Debug, Clone, Serialize)]
pub struct GuestSummary {
    pub total_bookings: usize,
    pub total_amount: f64,
    pub active_bookings: Vec<Booking>,
    pub past_bookings: Vec<Booking>,
}

impl GuestSummary {
    pub fn build(bookings: Vec<Booking>) -> Self {
        let total_bookings = bookings.len();
        let total_amount = bookings.iter().map(|b| b.total_amount).sum();
        let (active_bookings, past_bookings) = bookings
            .into_iter()
            .partition(|b| b.status == BookingStatus::Active);

        GuestSummary {
            total_bookings,
            total_amount,
            active_bookings,
            past_bookings,
        }
    }
}

pub async fn guest_summary(repo: &SqliteRepo, guest_id: GuestId) -> AppResult<GuestSummary> {
    let bookings = repo.list_guest_bookings(guest_id).await?;
    Ok(GuestSummary::build(bookings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(checkin: &str, checkout: &str, room_type: &str) -> BookingRequest {
        BookingRequest {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: "0700000000".to_string(),
            checkin: checkin.to_string(),
            checkout: checkout.to_string(),
            guests: "2".to_string(),
            room_type: room_type.to_string(),
        }
    }

    fn admin() -> Actor {
        Actor::Admin(AdminIdentity {
            id: 1,
            username: "frontdesk".to_string(),
        })
    }

    fn guest(id: GuestId) -> Actor {
        Actor::Guest(GuestIdentity {
            id,
            full_name: format!("Guest {}", id),
            email: format!("guest{}@example.com", id),
            phone_number: "0711111111".to_string(),
        })
    }

    async fn seeded(guest_id: Option<GuestId>) -> (SqliteRepo, Booking) {
        let repo = SqliteRepo::in_memory().await.unwrap();
        if let Some(id) = guest_id {
            sqlx::query("INSERT INTO guests (id, full_name, email, phone_number, password_hash, created_at) VALUES (?, 'G', ?, '1', 'x', '2024-01-01T00:00:00+00:00')")
                .bind(id)
                .bind(format!("g{}@example.com", id))
                .execute(&repo.pool)
                .await
                .unwrap();
        }
        let draft = request("2024-03-01", "2024-03-04", "Standard Room").validate().unwrap();
        let booking = create_booking(&repo, &draft, guest_id).await.unwrap();
        (repo, booking)
    }

    async fn status_of(repo: &SqliteRepo, id: BookingId) -> Option<BookingStatus> {
        repo.find_booking(id).await.unwrap().map(|b| b.status)
    }

    #[test]
    fn rates_per_room_type() {
        assert_eq!(nightly_rate("Standard Room"), 15500.0);
        assert_eq!(nightly_rate("Spacious Room"), 18500.0);
        assert_eq!(nightly_rate("Master Ensuite"), 23500.0);
        assert_eq!(nightly_rate("Presidential Suite"), 0.0);
        assert_eq!(nightly_rate("standard room"), 0.0);
    }

    #[test]
    fn price_counts_whole_days() {
        let (nights, total) = price_stay(date(2024, 3, 1), date(2024, 3, 4), "Standard Room").unwrap();
        assert_eq!(nights, 3);
        assert_eq!(total, 46500.0);

        let (nights, total) = price_stay(date(2024, 2, 28), date(2024, 3, 1), "Master Ensuite").unwrap();
        assert_eq!(nights, 2);
        assert_eq!(total, 47000.0);
    }

    #[test]
    fn unknown_room_type_is_accepted_at_zero() {
        let draft = request("2024-03-01", "2024-03-03", "Penthouse").validate().unwrap();
        assert_eq!(draft.nights, 2);
        assert_eq!(draft.total_amount, 0.0);
        assert_eq!(draft.room_type, "Penthouse");
    }

    #[test]
    fn checkout_must_follow_checkin() {
        assert_err!(request("2024-03-04", "2024-03-04", "Standard Room").validate());
        assert_err!(request("2024-03-05", "2024-03-04", "Standard Room").validate());

        let mut incomplete = request("2024-03-05", "2024-03-04", "Standard Room");
        incomplete.phone.clear();
        let err = incomplete.validate().unwrap_err();
        assert_eq!(err.to_string(), "All form fields are required for booking.");

        let err = request("2024-03-05", "2024-03-04", "Standard Room").validate().unwrap_err();
        assert_eq!(err.to_string(), "Check-out date must be after check-in date.");
    }

    #[test]
    fn rejects_blank_fields_and_bad_values() {
        let mut blank = request("2024-03-01", "2024-03-02", "Standard Room");
        blank.name = "   ".to_string();
        assert_err!(blank.validate());

        let mut bad_date = request("2024-03-01", "03/02/2024", "Standard Room");
        assert_err!(bad_date.validate());
        bad_date.checkout = "2024-03-02".to_string();
        bad_date.guests = "zero".to_string();
        assert_err!(bad_date.validate());
        bad_date.guests = "0".to_string();
        assert_err!(bad_date.validate());
    }

    #[test]
    fn pending_round_trip_keeps_derived_fields() {
        let draft = request("2024-03-01", "2024-03-04", "Standard Room").validate().unwrap();
        let pending = draft.clone().into_pending();
        assert_eq!(pending.nights, 3);
        assert_eq!(pending.total_amount, 46500.0);
        assert_eq!(BookingDraft::from(pending), draft);
    }

    #[test]
    fn contact_overwrite_keeps_stay() {
        let draft = request("2024-03-01", "2024-03-04", "Standard Room").validate().unwrap();
        let Actor::Guest(identity) = guest(9) else { unreachable!() };
        let merged = draft.clone().with_contact_of(&identity);
        assert_eq!(merged.full_name, "Guest 9");
        assert_eq!(merged.email, "guest9@example.com");
        assert_eq!(merged.phone_number, "0711111111");
        assert_eq!(merged.total_amount, draft.total_amount);
    }

    #[test]
    fn filter_query_treats_blank_as_absent() {
        let query = ActiveFilterQuery {
            start_date: Some("".to_string()),
            end_date: Some("2024-03-31".to_string()),
        };
        let filter = query.parse().unwrap();
        assert_eq!(filter.start_date, None);
        assert_eq!(filter.end_date, Some(date(2024, 3, 31)));

        let bad = ActiveFilterQuery {
            start_date: Some("March".to_string()),
            end_date: None,
        };
        assert_err!(bad.parse());
    }

    #[actix_web::test]
    async fn created_booking_is_active_with_submission_time() {
        let (_repo, booking) = seeded(None).await;
        assert_eq!(booking.status, BookingStatus::Active);
        assert_eq!(booking.nights, 3);
        assert_eq!(booking.total_amount, 46500.0);
        assert!(booking.book_out_time.is_none());
        assert!(booking.guest_id.is_none());
    }

    #[actix_web::test]
    async fn admin_book_out_sets_time_and_repeat_is_unchanged() {
        let (repo, booking) = seeded(None).await;

        let outcome = transition(&repo, booking.id, &admin(), BookingStatus::BookedOut).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);
        let stored = repo.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::BookedOut);
        assert!(stored.book_out_time.is_some());

        let again = transition(&repo, booking.id, &admin(), BookingStatus::BookedOut).await.unwrap();
        assert_eq!(again, TransitionOutcome::Unchanged);
    }

    #[actix_web::test]
    async fn admin_can_cancel_booked_out() {
        let (repo, booking) = seeded(None).await;
        transition(&repo, booking.id, &admin(), BookingStatus::BookedOut).await.unwrap();

        let outcome = transition(&repo, booking.id, &admin(), BookingStatus::Cancelled).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);
        assert_eq!(status_of(&repo, booking.id).await, Some(BookingStatus::Cancelled));

        let again = transition(&repo, booking.id, &admin(), BookingStatus::Cancelled).await.unwrap();
        assert_eq!(again, TransitionOutcome::Unchanged);
    }

    #[actix_web::test]
    async fn cancelled_booking_cannot_be_booked_out() {
        let (repo, booking) = seeded(None).await;
        transition(&repo, booking.id, &admin(), BookingStatus::Cancelled).await.unwrap();

        let err = transition(&repo, booking.id, &admin(), BookingStatus::BookedOut).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
        assert_eq!(err.to_string(), format!("Booking ID {} is Cancelled and cannot be booked out.", booking.id));
    }

    #[actix_web::test]
    async fn nothing_transitions_back_to_active() {
        let (repo, booking) = seeded(None).await;
        let err = transition(&repo, booking.id, &admin(), BookingStatus::Active).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
    }

    #[actix_web::test]
    async fn unknown_booking_is_not_found() {
        let (repo, _) = seeded(None).await;
        let err = transition(&repo, 999, &admin(), BookingStatus::Cancelled).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn guest_cannot_touch_other_guests_booking() {
        let (repo, booking) = seeded(Some(7)).await;

        for target in [BookingStatus::BookedOut, BookingStatus::Cancelled] {
            let err = transition(&repo, booking.id, &guest(8), target).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
        assert_eq!(status_of(&repo, booking.id).await, Some(BookingStatus::Active));
    }

    #[actix_web::test]
    async fn guest_cancel_removes_row() {
        let (repo, booking) = seeded(Some(7)).await;

        let outcome = transition(&repo, booking.id, &guest(7), BookingStatus::Cancelled).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Removed);
        assert_eq!(status_of(&repo, booking.id).await, None);
    }

    #[actix_web::test]
    async fn guest_book_out_then_cancel_is_rejected() {
        let (repo, booking) = seeded(Some(7)).await;

        let outcome = transition(&repo, booking.id, &guest(7), BookingStatus::BookedOut).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);

        let err = transition(&repo, booking.id, &guest(7), BookingStatus::Cancelled).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
        assert_eq!(status_of(&repo, booking.id).await, Some(BookingStatus::BookedOut));
    }

    #[actix_web::test]
    async fn guest_repeat_book_out_is_unchanged() {
        let (repo, booking) = seeded(Some(7)).await;

        let first = transition(&repo, booking.id, &guest(7), BookingStatus::BookedOut).await.unwrap();
        assert_eq!(first, TransitionOutcome::Applied);
        let stamped = repo.find_booking(booking.id).await.unwrap().unwrap().book_out_time;
        assert!(stamped.is_some());

        let again = transition(&repo, booking.id, &guest(7), BookingStatus::BookedOut).await.unwrap();
        assert_eq!(again, TransitionOutcome::Unchanged);
        assert_eq!(
            again.describe(booking.id, BookingStatus::BookedOut).level,
            crate::api::MessageLevel::Info
        );
        assert_eq!(repo.find_booking(booking.id).await.unwrap().unwrap().book_out_time, stamped);
    }

    #[actix_web::test]
    async fn racing_cancel_and_book_out_settle_on_one_state() {
        let (repo, booking) = seeded(None).await;

        let cancel = transition(&repo, booking.id, &admin(), BookingStatus::Cancelled).await;
        let book_out = transition(&repo, booking.id, &admin(), BookingStatus::BookedOut).await;

        assert_eq!(cancel.unwrap(), TransitionOutcome::Applied);
        assert!(matches!(book_out, Err(AppError::InvalidStateTransition(_))));
        assert_eq!(status_of(&repo, booking.id).await, Some(BookingStatus::Cancelled));
    }

    #[actix_web::test]
    async fn clear_all_removes_everything_and_restarts_ids() {
        let (repo, _) = seeded(None).await;
        let draft = request("2024-04-01", "2024-04-02", "Spacious Room").validate().unwrap();
        create_booking(&repo, &draft, None).await.unwrap();

        let Actor::Admin(identity) = admin() else { unreachable!() };
        assert_eq!(clear_all(&repo, &identity).await.unwrap(), 2);
        assert_eq!(repo.count_bookings().await.unwrap(), 0);

        let fresh = create_booking(&repo, &draft, None).await.unwrap();
        assert_eq!(fresh.id, 1);
    }

    #[actix_web::test]
    async fn active_filters_select_statement_variant() {
        let repo = SqliteRepo::in_memory().await.unwrap();
        let stays = [
            ("2024-03-01", "2024-03-04"),
            ("2024-03-10", "2024-03-12"),
            ("2024-04-01", "2024-04-05"),
        ];
        let mut ids = Vec::new();
        for (checkin, checkout) in stays {
            let draft = request(checkin, checkout, "Standard Room").validate().unwrap();
            ids.push(create_booking(&repo, &draft, None).await.unwrap().id);
        }
        transition(&repo, ids[2], &admin(), BookingStatus::BookedOut).await.unwrap();

        let ids_for = |bookings: Vec<Booking>| {
            let mut ids: Vec<BookingId> = bookings.into_iter().map(|b| b.id).collect();
            ids.sort();
            ids
        };

        let all = list_active_bookings(&repo, ActiveFilter::default()).await.unwrap();
        assert_eq!(ids_for(all), vec![ids[0], ids[1]]);

        let from = ActiveFilter { start_date: Some(date(2024, 3, 5)), end_date: None };
        assert_eq!(ids_for(list_active_bookings(&repo, from).await.unwrap()), vec![ids[1]]);

        let until = ActiveFilter { start_date: None, end_date: Some(date(2024, 3, 4)) };
        assert_eq!(ids_for(list_active_bookings(&repo, until).await.unwrap()), vec![ids[0]]);

        let between = ActiveFilter {
            start_date: Some(date(2024, 3, 1)),
            end_date: Some(date(2024, 3, 12)),
        };
        assert_eq!(ids_for(list_active_bookings(&repo, between).await.unwrap()), vec![ids[0], ids[1]]);

        // salida posterior al fin: fuera aunque la entrada cumpla
        let narrow = ActiveFilter {
            start_date: Some(date(2024, 3, 1)),
            end_date: Some(date(2024, 3, 11)),
        };
        assert_eq!(ids_for(list_active_bookings(&repo, narrow).await.unwrap()), vec![ids[0]]);

        let later = ActiveFilter {
            start_date: Some(date(2024, 3, 5)),
            end_date: Some(date(2024, 3, 12)),
        };
        assert_eq!(ids_for(list_active_bookings(&repo, later).await.unwrap()), vec![ids[1]]);
    }

    #[actix_web::test]
    async fn dashboard_counts_active_revenue_and_occupancy() {
        let repo = SqliteRepo::in_memory().await.unwrap();
        for room in ["Standard Room", "Standard Room", "Master Ensuite", "Attic"] {
            let draft = request("2024-03-01", "2024-03-03", room).validate().unwrap();
            create_booking(&repo, &draft, None).await.unwrap();
        }
        transition(&repo, 3, &admin(), BookingStatus::BookedOut).await.unwrap();

        let summary = dashboard_summary(&repo, ActiveFilter::default()).await.unwrap();
        assert_eq!(summary.total_active_bookings, 3);
        assert_eq!(summary.total_active_revenue, 62000.0);
        assert_eq!(summary.total_booked_out, 1);
        assert_eq!(
            summary.room_occupancy[0],
            RoomOccupancy {
                room_type: "Standard Room".to_string(),
                bookings_count: 2,
                guests_count: 4,
            }
        );
        assert_eq!(summary.room_occupancy[2].bookings_count, 0);
    }

    #[actix_web::test]
    async fn guest_summary_splits_active_and_past() {
        let (repo, first) = seeded(Some(7)).await;
        let draft = request("2024-05-01", "2024-05-02", "Spacious Room").validate().unwrap();
        create_booking(&repo, &draft, Some(7)).await.unwrap();
        transition(&repo, first.id, &guest(7), BookingStatus::BookedOut).await.unwrap();

        let summary = guest_summary(&repo, 7).await.unwrap();
        assert_eq!(summary.total_bookings, 2);
        assert_eq!(summary.total_amount, 46500.0 + 18500.0);
        assert_eq!(summary.active_bookings.len(), 1);
        assert_eq!(summary.past_bookings.len(), 1);
        assert_eq!(summary.past_bookings[0].id, first.id);
    }

    #[test]
    fn outcome_messages() {
        let msg = TransitionOutcome::Unchanged.describe(4, BookingStatus::BookedOut);
        assert_eq!(msg, StatusMessage::info("Booking ID 4 is already booked out."));
        let msg = TransitionOutcome::Removed.describe(4, BookingStatus::Cancelled);
        assert_eq!(msg, StatusMessage::success("Booking ID 4 has been successfully cancelled."));
    }
}
