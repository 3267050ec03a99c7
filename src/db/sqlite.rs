use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::api::middleware::ErrorLogExt;
use crate::api::{AppError, AppResult};
use crate::config::AppConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS guests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone_number TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone_number TEXT NOT NULL,
        check_in_date TEXT NOT NULL,
        check_out_date TEXT NOT NULL,
        nights INTEGER NOT NULL,
        num_guests INTEGER NOT NULL,
        room_type TEXT NOT NULL,
        total_amount REAL NOT NULL,
        submission_time TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'Active'
            CHECK (status IN ('Active', 'Booked Out', 'Cancelled')),
        book_out_time TEXT NULL,
        guest_id INTEGER NULL REFERENCES guests(id) ON DELETE SET NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings (status)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_guest_id ON bookings (guest_id)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_check_in ON bookings (check_in_date)",
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions (expires_at)",
];

/// Repositorio SQLite compartido por todos los handlers
#[derive(Debug, Clone)]
pub struct SqliteRepo {
    pub pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn init(config: &AppConfig) -> AppResult<SqliteRepo> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| AppError::Config(format!("invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect_with(options)
            .await
            .log_error_context("connecting to SQLite")
            .map_err(|e| AppError::database("connect", e))?;

        // Test connection
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| AppError::database("ping", e))?;

        tracing::info!(url = %config.database_url, "SQLite connection established");

        Ok(SqliteRepo { pool })
    }

    /// Base de datos en memoria con una única conexión que nunca se recicla,
    /// de lo contrario cada conexión vería una base distinta
    pub async fn in_memory() -> AppResult<SqliteRepo> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::database("in_memory_options", e))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database("connect_in_memory", e))?;

        let repo = SqliteRepo { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Crea tablas e índices si no existen
    pub async fn create_schema(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .log_error_context("creating schema")
                .map_err(|e| AppError::database("create_schema", e))?;
        }

        tracing::debug!("SQLite schema ready");
        Ok(())
    }

    pub fn current_timestamp() -> DateTime<Utc> {
        Utc::now()
    }
}
