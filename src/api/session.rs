//! # Contexto de sesión por petición
//!
//! Cada handler carga su [`SessionContext`] a partir de la cookie, trabaja
//! sobre [`SessionData`] y termina con [`SessionContext::redirect`] (formularios)
//! o [`SessionContext::json`] (vistas). Ambos guardan la sesión y reemiten la
//! cookie.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use super::{AppError, AppResult, AppState, StatusMessage};
use crate::session::{AdminIdentity, GuestIdentity, SessionData, SessionToken};

pub const ADMIN_REQUIRED: &str = "Access denied. Please log in as an admin.";
pub const GUEST_REQUIRED: &str = "Please log in to access your bookings.";

#[derive(Debug)]
pub struct SessionContext {
    token: SessionToken,
    is_new: bool,
    pub data: SessionData,
}

impl SessionContext {
    /// Carga la sesión de la cookie. Una cookie ausente, malformada o
    /// caducada abre una sesión nueva.
    pub async fn load(req: &HttpRequest, state: &AppState) -> AppResult<Self> {
        let token = req
            .cookie(&state.settings.cookie_name)
            .and_then(|cookie| SessionToken::parse(cookie.value()));

        if let Some(token) = token {
            if let Some(data) = state.sessions.get(&token).await? {
                return Ok(Self {
                    token,
                    is_new: false,
                    data,
                });
            }
            tracing::debug!(token = %token, "unknown session token, starting a new session");
        }

        Ok(Self {
            token: SessionToken::generate(),
            is_new: true,
            data: SessionData::default(),
        })
    }

    pub fn flash(&mut self, message: StatusMessage) {
        self.data.flash = Some(message);
    }

    pub fn admin(&self) -> AppResult<AdminIdentity> {
        self.data
            .admin
            .clone()
            .ok_or_else(|| AppError::Unauthorized(ADMIN_REQUIRED.to_string()))
    }

    pub fn guest(&self) -> AppResult<GuestIdentity> {
        self.data
            .guest
            .clone()
            .ok_or_else(|| AppError::Unauthorized(GUEST_REQUIRED.to_string()))
    }

    /// Persiste la sesión. Las sesiones vacías no se guardan y, si existían,
    /// se borran del almacén.
    async fn save(&self, state: &AppState) -> AppResult<Option<Cookie<'static>>> {
        if self.data.is_empty() {
            if !self.is_new {
                state.sessions.delete(&self.token).await?;
            }
            return Ok(None);
        }

        state.sessions.set(&self.token, &self.data).await?;

        let cookie = Cookie::build(state.settings.cookie_name.clone(), self.token.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(state.settings.cookie_secure)
            .finish();
        Ok(Some(cookie))
    }

    /// Guarda la sesión y responde `303 See Other` hacia `location`
    pub async fn redirect(self, state: &AppState, location: &str) -> AppResult<HttpResponse> {
        let cookie = self.save(state).await?;

        let mut response = HttpResponse::SeeOther();
        response.insert_header((header::LOCATION, location));
        if let Some(cookie) = cookie {
            response.cookie(cookie);
        }
        Ok(response.finish())
    }

    /// Guarda la sesión y responde con el cuerpo JSON
    pub async fn json<T: Serialize>(self, state: &AppState, body: &T) -> AppResult<HttpResponse> {
        let cookie = self.save(state).await?;

        let mut response = HttpResponse::Ok();
        if let Some(cookie) = cookie {
            response.cookie(cookie);
        }
        Ok(response.json(body))
    }
}
