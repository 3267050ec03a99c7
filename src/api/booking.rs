//! # API de Reservas
//!
//! Formulario público de reserva. Un huésped con sesión reserva directamente;
//! un visitante anónimo deja la reserva pendiente en su sesión hasta que se
//! registre o inicie sesión.

use actix_web::{get, post, web, HttpRequest, Responder};
use serde::Serialize;

use super::session::SessionContext;
use super::{pages, AppResult, AppState, StatusMessage};
use crate::lifecycle::{self, BookingRequest};
use crate::session::PendingBooking;

#[derive(Serialize)]
struct PendingBookingView {
    pending_booking: PendingBooking,
    message: Option<StatusMessage>,
}

#[post("/bookings")]
async fn submit_booking(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<BookingRequest>,
) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(e) => {
            ctx.flash(e.status_message());
            return ctx.redirect(&state, pages::HOME).await;
        }
    };

    let Some(guest) = ctx.data.guest.clone() else {
        // Una reserva nueva reemplaza la que hubiera pendiente
        ctx.data.pending_booking = Some(draft.into_pending());
        ctx.flash(StatusMessage::info(
            "Please register or log in to confirm your booking.",
        ));
        tracing::debug!("Booking parked in session until authentication");
        return ctx.redirect(&state, pages::CONFIRM_BOOKING).await;
    };

    match lifecycle::create_booking(&state.repo, &draft, Some(guest.id)).await {
        Ok(booking) => {
            ctx.flash(StatusMessage::success(format!(
                "Booking confirmed! Your booking ID is {}.",
                booking.id
            )));
            ctx.redirect(&state, pages::GUEST_BOOKINGS).await
        }
        Err(e) => {
            ctx.flash(e.status_message());
            ctx.redirect(&state, pages::HOME).await
        }
    }
}

/// Resumen de la reserva pendiente para la página de confirmación
#[get("/bookings/confirm")]
async fn pending_booking(req: HttpRequest, state: web::Data<AppState>) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;

    match ctx.data.pending_booking.clone() {
        Some(pending_booking) => {
            let message = ctx.data.take_flash();
            ctx.json(&state, &PendingBookingView { pending_booking, message }).await
        }
        None => {
            ctx.flash(StatusMessage::error(
                "No pending booking found. Please fill in the booking form.",
            ));
            ctx.redirect(&state, pages::HOME).await
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_booking);
    cfg.service(pending_booking);
}
