//! # Módulo API
//!
//! Rutas y controladores HTTP del sitio del hotel.
//!
//! Los formularios (POST) responden siempre con `303 See Other` hacia una
//! página estática y dejan un mensaje de estado en la sesión. Las vistas
//! (GET) responden JSON e incluyen, consumiéndolo, ese mensaje.
//!
//! ## Módulos principales
//!
//! - [`booking`] - Formulario público de reserva y confirmación pendiente
//! - [`guest`] - Registro, login y "mis reservas" del huésped
//! - [`admin`] - Registro, login y panel de administración
//! - [`session`] - Contexto de sesión por petición
//! - [`errors`] - Manejo de errores de la aplicación

pub mod admin;
pub mod booking;
pub mod errors;
pub mod guest;
pub mod middleware;
pub mod session;

// Re-exportar tipos comunes para facilitar su uso
pub use errors::{AppError, AppResult, ErrorResponse, MessageLevel, ResultExt, StatusMessage};

use actix_web::{get, web, HttpRequest, Responder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SessionSettings;
use crate::db::models::BookingId;
use crate::db::SqliteRepo;
use crate::session::SessionStore;
use session::SessionContext;

/// Páginas estáticas a las que redirigen los formularios
pub mod pages {
    pub const HOME: &str = "/static/index.html";
    pub const CONFIRM_BOOKING: &str = "/static/confirm_booking.html";
    pub const GUEST_REGISTER: &str = "/static/guest_register.html";
    pub const GUEST_LOGIN: &str = "/static/guest_login.html";
    pub const GUEST_BOOKINGS: &str = "/static/my_bookings.html";
    pub const ADMIN_REGISTER: &str = "/static/admin_register.html";
    pub const ADMIN_LOGIN: &str = "/static/admin_login.html";
    pub const ADMIN_DASHBOARD: &str = "/static/admin_dashboard.html";
}

/// Estado compartido por todos los handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: SqliteRepo,
    pub sessions: Arc<dyn SessionStore>,
    pub settings: SessionSettings,
}

/// Formulario con el ID de la reserva sobre la que actuar
#[derive(Debug, Deserialize)]
pub struct BookingIdForm {
    #[serde(default)]
    pub booking_id: String,
}

impl BookingIdForm {
    pub fn parse(&self) -> AppResult<BookingId> {
        self.booking_id
            .trim()
            .parse::<BookingId>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Validation("Invalid booking ID.".to_string()))
    }
}

#[derive(Serialize)]
struct MessageView {
    message: Option<StatusMessage>,
}

/// Devuelve y consume el mensaje de estado pendiente
#[get("/messages")]
async fn pop_message(req: HttpRequest, state: web::Data<AppState>) -> AppResult<impl Responder> {
    let mut ctx = SessionContext::load(&req, &state).await?;
    let message = ctx.data.take_flash();
    ctx.json(&state, &MessageView { message }).await
}

/// Configura todas las rutas de la API
///
/// ## Rutas configuradas
///
/// - `/bookings*` - Ver [`booking::routes`]
/// - `/guests/*` - Ver [`guest::routes`]
/// - `/admin/*` - Ver [`admin::routes`]
/// - `/messages`
///
/// # Ejemplo
///
/// ```no_run
/// use actix_web::{web, App};
/// use supremacy_hotel::api;
///
/// let app = App::new()
///     .configure(api::init_routes);
/// ```
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    booking::routes(cfg);
    guest::routes(cfg);
    admin::routes(cfg);
    cfg.service(pop_message);
}
