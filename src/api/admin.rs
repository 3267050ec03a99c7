//! # API de Administración
//!
//! Registro y login de administradores, panel con ocupación e ingresos y
//! acciones sobre cualquier reserva. Todas las rutas salvo registro y login
//! exigen un administrador en la sesión.

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

use super::session::SessionContext;
use super::{pages, AppResult, AppState, BookingIdForm, StatusMessage};
use crate::auth::{self, AdminLogin, AdminRegistration, Role};
use crate::db::{Booking, BookingStatus};
use crate::lifecycle::{self, Actor, ActiveFilter, ActiveFilterQuery, DashboardSummary};
use crate::session::AdminIdentity;

#[derive(Serialize)]
struct DashboardView {
    admin: AdminIdentity,
    #[serde(flatten)]
    summary: DashboardSummary,
    message: Option<StatusMessage>,
}

#[derive(Serialize)]
struct ActiveBookingsView {
    filter: ActiveFilter,
    bookings: Vec<Booking>,
}

#[post("/admin/register")]
async fn register(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<AdminRegistration>,
) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;

    match auth::register_admin(&state.repo, &form).await {
        Ok(_) => {
            ctx.flash(StatusMessage::success("Registration successful! Please log in."));
            ctx.redirect(&state, pages::ADMIN_LOGIN).await
        }
        Err(e) => {
            ctx.flash(e.status_message());
            ctx.redirect(&state, pages::ADMIN_REGISTER).await
        }
    }
}

#[post("/admin/login")]
async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<AdminLogin>,
) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;

    match auth::login_admin(&state.repo, &mut ctx.data, &form).await {
        Ok(admin) => {
            ctx.flash(StatusMessage::success(format!("Welcome, {}!", admin.username)));
            ctx.redirect(&state, pages::ADMIN_DASHBOARD).await
        }
        Err(e) => {
            ctx.flash(e.status_message());
            ctx.redirect(&state, pages::ADMIN_LOGIN).await
        }
    }
}

#[post("/admin/logout")]
async fn logout(req: HttpRequest, state: web::Data<AppState>) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;
    auth::logout(&mut ctx.data, Role::Admin);
    ctx.flash(StatusMessage::success("You have been logged out."));
    ctx.redirect(&state, pages::ADMIN_LOGIN).await
}

/// Carga la sesión y exige administrador. Sin él devuelve la redirección al
/// login ya preparada.
async fn require_admin(
    req: &HttpRequest,
    state: &AppState,
) -> AppResult<Result<(SessionContext, AdminIdentity), HttpResponse>> {
    let mut ctx = SessionContext::load(req, state).await?;

    match ctx.admin() {
        Ok(admin) => Ok(Ok((ctx, admin))),
        Err(e) => {
            ctx.flash(e.status_message());
            Ok(Err(ctx.redirect(state, pages::ADMIN_LOGIN).await?))
        }
    }
}

#[get("/admin/dashboard")]
async fn dashboard(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ActiveFilterQuery>,
) -> AppResult<impl Responder> {
    let (mut ctx, admin) = match require_admin(&req, &state).await? {
        Ok(session) => session,
        Err(redirect) => return Ok(redirect),
    };

    let filter = query.parse()?;
    let summary = lifecycle::dashboard_summary(&state.repo, filter).await?;
    let message = ctx.data.take_flash();
    ctx.json(&state, &DashboardView { admin, summary, message }).await
}

#[get("/admin/bookings/active")]
async fn active_bookings(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ActiveFilterQuery>,
) -> AppResult<impl Responder> {
    let (ctx, _) = match require_admin(&req, &state).await? {
        Ok(session) => session,
        Err(redirect) => return Ok(redirect),
    };

    let filter = query.parse()?;
    let bookings = lifecycle::list_active_bookings(&state.repo, filter).await?;
    ctx.json(&state, &ActiveBookingsView { filter, bookings }).await
}

async fn admin_transition(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<BookingIdForm>,
    target: BookingStatus,
) -> AppResult<HttpResponse> {
    let (mut ctx, admin) = match require_admin(&req, &state).await? {
        Ok(session) => session,
        Err(redirect) => return Ok(redirect),
    };

    let message = match form.parse() {
        Ok(booking_id) => {
            match lifecycle::transition(&state.repo, booking_id, &Actor::Admin(admin), target).await {
                Ok(outcome) => outcome.describe(booking_id, target),
                Err(e) => e.status_message(),
            }
        }
        Err(e) => e.status_message(),
    };

    ctx.flash(message);
    ctx.redirect(&state, pages::ADMIN_DASHBOARD).await
}

#[post("/admin/bookings/book-out")]
async fn book_out(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<BookingIdForm>,
) -> AppResult<impl Responder> {
    admin_transition(req, state, form, BookingStatus::BookedOut).await
}

#[post("/admin/bookings/cancel")]
async fn cancel(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<BookingIdForm>,
) -> AppResult<impl Responder> {
    admin_transition(req, state, form, BookingStatus::Cancelled).await
}

#[post("/admin/bookings/clear")]
async fn clear_bookings(req: HttpRequest, state: web::Data<AppState>) -> AppResult<impl Responder> {
    let (mut ctx, admin) = match require_admin(&req, &state).await? {
        Ok(session) => session,
        Err(redirect) => return Ok(redirect),
    };

    let message = match lifecycle::clear_all(&state.repo, &admin).await {
        Ok(removed) => StatusMessage::success(format!(
            "All bookings have been cleared ({} removed).",
            removed
        )),
        Err(e) => e.status_message(),
    };

    ctx.flash(message);
    ctx.redirect(&state, pages::ADMIN_DASHBOARD).await
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register);
    cfg.service(login);
    cfg.service(logout);
    cfg.service(dashboard);
    cfg.service(active_bookings);
    cfg.service(book_out);
    cfg.service(cancel);
    cfg.service(clear_bookings);
}
