//! # API de Huéspedes
//!
//! Registro e inicio de sesión (ambos confirman la reserva pendiente), cierre
//! de sesión y autogestión de las reservas propias.

use actix_web::{get, post, web, HttpRequest, Responder};
use serde::Serialize;

use super::session::SessionContext;
use super::{pages, AppResult, AppState, BookingIdForm, StatusMessage};
use crate::auth::{self, GuestLogin, GuestRegistration, Role};
use crate::db::BookingStatus;
use crate::lifecycle::{self, Actor, GuestSummary};
use crate::session::GuestIdentity;

#[derive(Serialize)]
struct GuestBookingsView {
    guest: GuestIdentity,
    #[serde(flatten)]
    summary: GuestSummary,
    message: Option<StatusMessage>,
}

#[post("/guests/register")]
async fn register(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<GuestRegistration>,
) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;

    match auth::register_guest(&state.repo, &mut ctx.data, &form).await {
        Ok(outcome) => {
            ctx.flash(outcome.status_message("Registration"));
            ctx.redirect(&state, pages::GUEST_BOOKINGS).await
        }
        Err(e) => {
            ctx.flash(e.status_message());
            ctx.redirect(&state, pages::GUEST_REGISTER).await
        }
    }
}

#[post("/guests/login")]
async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<GuestLogin>,
) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;

    match auth::login_guest(&state.repo, &mut ctx.data, &form).await {
        Ok(outcome) => {
            ctx.flash(outcome.status_message("Login"));
            ctx.redirect(&state, pages::GUEST_BOOKINGS).await
        }
        Err(e) => {
            ctx.flash(e.status_message());
            ctx.redirect(&state, pages::GUEST_LOGIN).await
        }
    }
}

#[post("/guests/logout")]
async fn logout(req: HttpRequest, state: web::Data<AppState>) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;
    auth::logout(&mut ctx.data, Role::Guest);
    ctx.flash(StatusMessage::success("You have been logged out."));
    ctx.redirect(&state, pages::HOME).await
}

#[get("/guests/bookings")]
async fn my_bookings(req: HttpRequest, state: web::Data<AppState>) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;

    let guest = match ctx.guest() {
        Ok(guest) => guest,
        Err(e) => {
            ctx.flash(e.status_message());
            return ctx.redirect(&state, pages::GUEST_LOGIN).await;
        }
    };

    let summary = lifecycle::guest_summary(&state.repo, guest.id).await?;
    let message = ctx.data.take_flash();
    ctx.json(&state, &GuestBookingsView { guest, summary, message }).await
}

async fn guest_transition(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<BookingIdForm>,
    target: BookingStatus,
) -> AppResult<actix_web::HttpResponse> {
    let mut ctx = SessionContext::load(&req, &state).await?;

    let guest = match ctx.guest() {
        Ok(guest) => guest,
        Err(e) => {
            ctx.flash(e.status_message());
            return ctx.redirect(&state, pages::GUEST_LOGIN).await;
        }
    };

    let message = match form.parse() {
        Ok(booking_id) => {
            match lifecycle::transition(&state.repo, booking_id, &Actor::Guest(guest), target).await {
                Ok(outcome) => outcome.describe(booking_id, target),
                Err(e) => e.status_message(),
            }
        }
        Err(e) => e.status_message(),
    };

    ctx.flash(message);
    ctx.redirect(&state, pages::GUEST_BOOKINGS).await
}

#[post("/guests/bookings/book-out")]
async fn book_out(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<BookingIdForm>,
) -> AppResult<impl Responder> {
    guest_transition(req, state, form, BookingStatus::BookedOut).await
}

#[post("/guests/bookings/cancel")]
async fn cancel(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<BookingIdForm>,
) -> AppResult<impl Responder> {
    guest_transition(req, state, form, BookingStatus::Cancelled).await
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register);
    cfg.service(login);
    cfg.service(logout);
    cfg.service(my_bookings);
    cfg.service(book_out);
    cfg.service(cancel);
}
