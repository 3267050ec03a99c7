//! # Supremacy Hotel
//!
//! Sitio de reservas de un hotel: formulario público, portal del huésped y
//! panel de administración sobre SQLite.
//!
//! - [`lifecycle`] - Alta de reservas y transiciones Active → Booked Out / Cancelled
//! - [`auth`] - Cuentas, login y traspaso de la reserva pendiente
//! - [`session`] - Estado de sesión y sus almacenes
//! - [`db`] - Repositorio SQLite
//! - [`api`] - Rutas HTTP
//! - [`config`] - Configuración desde el entorno

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod session;
