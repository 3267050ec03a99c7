//! Cuentas de huéspedes y administradores

use super::models::{AdminAccount, GuestAccount, GuestId};
use super::SqliteRepo;
use crate::api::middleware::ErrorLogExt;
use crate::api::{AppError, AppResult};

const GUEST_COLUMNS: &str =
    "SELECT id, full_name, email, phone_number, password_hash, created_at FROM guests";
const ADMIN_COLUMNS: &str =
    "SELECT id, username, email, password_hash, created_at FROM admins";

impl SqliteRepo {
    pub async fn guest_email_exists(&self, email: &str) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM guests WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .log_error_context("checking guest email")
            .map_err(|e| AppError::database("guest_email_exists", e))?;

        Ok(found.is_some())
    }

    pub async fn insert_guest(
        &self,
        full_name: &str,
        email: &str,
        phone_number: &str,
        password_hash: &str,
    ) -> AppResult<GuestAccount> {
        let result = sqlx::query(
            "INSERT INTO guests (full_name, email, phone_number, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(full_name)
        .bind(email)
        .bind(phone_number)
        .bind(password_hash)
        .bind(SqliteRepo::current_timestamp())
        .execute(&self.pool)
        .await
        .log_error_context("inserting guest")
        .map_err(|e| AppError::database("insert_guest", e))?;

        let id = result.last_insert_rowid();
        self.find_guest(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("guest {} vanished after insert", id)))
    }

    pub async fn find_guest(&self, id: GuestId) -> AppResult<Option<GuestAccount>> {
        sqlx::query_as::<_, GuestAccount>(&format!("{} WHERE id = ?", GUEST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database("find_guest", e))
    }

    pub async fn find_guest_by_email(&self, email: &str) -> AppResult<Option<GuestAccount>> {
        sqlx::query_as::<_, GuestAccount>(&format!("{} WHERE email = ?", GUEST_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .log_error_context("looking up guest by email")
            .map_err(|e| AppError::database("find_guest_by_email", e))
    }

    pub async fn admin_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM admins WHERE username = ? OR email = ? LIMIT 1")
                .bind(username)
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .log_error_context("checking admin uniqueness")
                .map_err(|e| AppError::database("admin_exists", e))?;

        Ok(found.is_some())
    }

    pub async fn insert_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<AdminAccount> {
        let result = sqlx::query(
            "INSERT INTO admins (username, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(SqliteRepo::current_timestamp())
        .execute(&self.pool)
        .await
        .log_error_context("inserting admin")
        .map_err(|e| AppError::database("insert_admin", e))?;

        let id = result.last_insert_rowid();
        sqlx::query_as::<_, AdminAccount>(&format!("{} WHERE id = ?", ADMIN_COLUMNS))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database("find_admin", e))
    }

    /// Busca por nombre de usuario o email. Devuelve todas las coincidencias
    /// para que el llamador exija exactamente una.
    pub async fn find_admins_by_identifier(&self, identifier: &str) -> AppResult<Vec<AdminAccount>> {
        sqlx::query_as::<_, AdminAccount>(&format!(
            "{} WHERE username = ? OR email = ?",
            ADMIN_COLUMNS
        ))
        .bind(identifier)
        .bind(identifier)
        .fetch_all(&self.pool)
        .await
        .log_error_context("looking up admin")
        .map_err(|e| AppError::database("find_admins_by_identifier", e))
    }
}
