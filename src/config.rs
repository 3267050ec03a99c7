//! # Configuración
//!
//! El servidor se configura mediante variables de entorno (archivo `.env`):
//!
//! ```env
//! DATABASE_URL=sqlite://supremacy_hotel.db
//! DATABASE_MAX_CONNECTIONS=5
//! BIND_ADDRESS=0.0.0.0:8080
//! SESSION_BACKEND=memory
//! SESSION_TTL_MINUTES=1440
//! SESSION_COOKIE_NAME=hotel_session
//! SESSION_COOKIE_SECURE=false
//! RUST_LOG=debug,sqlx=warn
//! ```

use crate::api::{AppError, AppResult};
use std::env;
use std::str::FromStr;

/// Dónde viven las sesiones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    /// En memoria del proceso; se pierden al reiniciar
    Memory,
    /// Tabla `sessions` en la misma base de datos
    Sqlite,
}

impl FromStr for SessionBackend {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(AppError::Config(format!(
                "SESSION_BACKEND must be 'memory' or 'sqlite', got '{}'",
                other
            ))),
        }
    }
}

/// Parámetros de la cookie y caducidad de sesión
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub backend: SessionBackend,
    pub ttl_minutes: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            ttl_minutes: 24 * 60,
            cookie_name: "hotel_session".to_string(),
            cookie_secure: false,
        }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ttl_minutes)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_address: String,
    pub session: SessionSettings,
}

impl AppConfig {
    /// Lee la configuración del entorno aplicando valores por defecto
    ///
    /// # Errores
    ///
    /// `AppError::Config` si alguna variable tiene un valor no interpretable.
    pub fn from_env() -> AppResult<Self> {
        let defaults = SessionSettings::default();

        let session = SessionSettings {
            backend: var_or("SESSION_BACKEND", "memory").parse()?,
            ttl_minutes: parse_var("SESSION_TTL_MINUTES", defaults.ttl_minutes)?,
            cookie_name: var_or("SESSION_COOKIE_NAME", &defaults.cookie_name),
            cookie_secure: parse_var("SESSION_COOKIE_SECURE", defaults.cookie_secure)?,
        };

        check_ttl_minutes(session.ttl_minutes)?;

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://supremacy_hotel.db"),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            bind_address: var_or("BIND_ADDRESS", "0.0.0.0:8080"),
            session,
        })
    }
}

/// Caducidad máxima de sesión: un año
pub const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;

fn check_ttl_minutes(minutes: i64) -> AppResult<()> {
    if minutes <= 0 || minutes > MAX_SESSION_TTL_MINUTES {
        return Err(AppError::Config(format!(
            "SESSION_TTL_MINUTES must be between 1 and {}, got {}",
            MAX_SESSION_TTL_MINUTES, minutes
        )));
    }
    Ok(())
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} has an invalid value '{}': {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}
