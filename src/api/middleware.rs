//! # Utilidades de logging para errores
//!
//! Registra la cadena completa de un error (`source()` tras `source()`) en el
//! punto donde ocurre, con el contexto de la operación.

use std::error::Error as StdError;

/// Recorre la cadena de errores y la devuelve como lista de mensajes
pub fn error_chain<E>(error: &E) -> Vec<String>
where
    E: StdError + 'static,
{
    let mut chain = Vec::new();
    let mut current: Option<&dyn StdError> = Some(error);

    while let Some(err) = current {
        chain.push(err.to_string());
        current = err.source();
    }

    chain
}

/// Registra la cadena completa de errores
///
/// # Ejemplo
/// ```ignore
/// if let Err(e) = repo.insert_booking(&draft, None).await {
///     log_error_chain(&e, Some("inserting booking"));
/// }
/// ```
pub fn log_error_chain<E>(error: &E, context: Option<&str>)
where
    E: StdError + 'static,
{
    let chain = error_chain(error);

    match context {
        Some(ctx) => tracing::error!(context = %ctx, error_chain = ?chain, "Error with full chain"),
        None => tracing::error!(error_chain = ?chain, "Error with full chain"),
    }
}

/// Extension trait para Results que registra la cadena de errores
///
/// ```ignore
/// sqlx::query("DELETE FROM bookings")
///     .execute(&pool)
///     .await
///     .log_error_context("clearing bookings")?;
/// ```
pub trait ErrorLogExt<T, E> {
    /// Registra la cadena a nivel ERROR con contexto
    fn log_error_context(self, context: &str) -> Result<T, E>;

    /// Registra la cadena a nivel WARN con contexto, para fallos esperables
    fn log_warn_context(self, context: &str) -> Result<T, E>;
}

impl<T, E> ErrorLogExt<T, E> for Result<T, E>
where
    E: StdError + 'static,
{
    fn log_error_context(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            log_error_chain(error, Some(context));
        }
        self
    }

    fn log_warn_context(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            tracing::warn!(
                context = %context,
                error_chain = ?error_chain(error),
                "Warning with error chain"
            );
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AppError;

    #[test]
    fn chain_includes_sources() {
        let err = AppError::database("find_booking", sqlx::Error::RowNotFound);
        let chain = error_chain(&err);
        assert_eq!(chain.len(), 2);
        assert!(chain[0].contains("find_booking"));
        assert_eq!(chain[1], sqlx::Error::RowNotFound.to_string());
    }

    #[test]
    fn log_ext_passes_result_through() {
        let ok: Result<u8, AppError> = Ok(3);
        assert_eq!(ok.log_error_context("noop").unwrap(), 3);

        let err: Result<u8, AppError> = Err(AppError::Internal("boom".into()));
        assert!(err.log_warn_context("noop").is_err());
    }
}
