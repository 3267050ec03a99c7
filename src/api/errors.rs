//! # Manejo de errores
//!
//! Jerarquía de errores de la aplicación construida con thiserror. Cada
//! variante sabe convertirse en una respuesta JSON (vistas GET) o en un
//! mensaje de estado para el flujo de formularios con redirección.

use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;

/// Tipos de error de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de base de datos con la operación que lo provocó
    ///
    /// Mantiene la cadena de errores original de sqlx para depuración.
    #[error("Database error during '{operation}': {source}")]
    Database {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    /// Error de validación con campo específico
    #[error("{message}")]
    ValidationWithField { field: String, message: String },

    /// Error de validación general
    #[error("{0}")]
    Validation(String),

    /// Credenciales incorrectas. El mensaje es siempre el mismo para no
    /// revelar qué cuentas existen.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Acceso a un área sin la identidad requerida
    #[error("{0}")]
    Unauthorized(String),

    /// Recurso no encontrado (o no pertenece al actor)
    #[error("{0}")]
    NotFound(String),

    /// La reserva no está en el estado previo esperado
    #[error("{0}")]
    InvalidStateTransition(String),

    /// Error del almacén de sesiones
    #[error("Session error: {0}")]
    Session(String),

    /// Error de configuración al arrancar
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error interno simple
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Crea un error de base de datos con contexto de operación
    pub fn database(operation: &str, source: sqlx::Error) -> Self {
        Self::Database {
            operation: operation.to_string(),
            source,
        }
    }

    /// Crea un error de validación con campo específico
    pub fn validation_field(field: &str, message: &str) -> Self {
        Self::ValidationWithField {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Resultados que no son fallos duros: otro actor pudo haber llegado antes
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidStateTransition(_))
    }

    /// Convierte el error en el mensaje que verá el usuario tras la redirección
    pub fn status_message(&self) -> StatusMessage {
        if self.is_informational() {
            StatusMessage::info(self.to_string())
        } else {
            StatusMessage::error(self.to_string())
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Database { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    error_chain = ?source.source(),
                    "Database error occurred"
                );
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Database error".to_string(),
                    message: self.to_string(),
                })
            }
            Self::ValidationWithField { field, message } => {
                tracing::warn!(field = %field, message = %message, "Validation error");
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation error".to_string(),
                    message: format!("Field '{}': {}", field, message),
                })
            }
            Self::Validation(message) => {
                tracing::warn!(message = %message, "Validation error");
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation error".to_string(),
                    message: message.clone(),
                })
            }
            Self::InvalidCredentials(message) | Self::Unauthorized(message) => {
                tracing::warn!(message = %message, "Unauthorized access attempt");
                HttpResponse::Unauthorized().json(ErrorResponse {
                    error: "Unauthorized".to_string(),
                    message: message.clone(),
                })
            }
            Self::NotFound(message) => {
                tracing::info!(message = %message, "Resource not found");
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    message: message.clone(),
                })
            }
            Self::InvalidStateTransition(message) => {
                tracing::info!(message = %message, "Invalid state transition");
                HttpResponse::Conflict().json(ErrorResponse {
                    error: "Invalid state transition".to_string(),
                    message: message.clone(),
                })
            }
            error => {
                tracing::error!(
                    error = %error,
                    error_chain = ?error.source(),
                    "General error"
                );
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Error".to_string(),
                    message: error.to_string(),
                })
            }
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

pub type AppResult<T> = Result<T, AppError>;

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database {
            operation: "database_operation".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Session(format!("invalid session payload: {}", e))
    }
}

/// Nivel visual del mensaje de estado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Success,
    Info,
    Error,
}

/// Mensaje de un solo uso que un formulario deja en la sesión para la
/// siguiente vista
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}

pub trait ResultExt<T> {
    fn map_err_internal(self, message: &str) -> AppResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + 'static,
{
    fn map_err_internal(self, message: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Internal(format!("{}: {}", message, e)))
    }
}
