//! # Supremacy Hotel Server
//!
//! Servidor web del sitio de reservas del hotel construido con Rust, Actix Web y SQLite.
//!
//! ## Características principales
//!
//! - **Reserva pública**: formulario sin cuenta; la reserva queda pendiente hasta el login
//! - **Portal del huésped**: registro, login, "mis reservas", book out y cancelación
//! - **Panel de administración**: ocupación por tipo de habitación, ingresos y gestión de reservas
//! - **Frontend incluido**: páginas HTML estáticas en `./static`
//!
//! ## Configuración
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
//! RUST_LOG=info
//! ```
//!
//! ## Arquitectura
//!
//! ```text
//! Frontend (HTML/JS)
//!     ↓ formularios + JSON
//! API (Actix Web) ── SessionStore (memoria | SQLite)
//!     ↓ sqlx
//! SQLite
//! ```

use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use std::time::Duration;

use supremacy_hotel::api::middleware::ErrorLogExt;
use supremacy_hotel::api::{self, AppState};
use supremacy_hotel::config::{AppConfig, SessionBackend};
use supremacy_hotel::db::{SqliteRepo, SqliteSessionStore};
use supremacy_hotel::session::{MemorySessionStore, SessionStore};

/// Cada cuánto se purgan las sesiones caducadas en SQLite
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

fn io_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

/// Función principal que inicia el servidor web
///
/// 1. Carga variables de entorno desde `.env`
/// 2. Configura el logging con tracing
/// 3. Abre SQLite y crea el esquema
/// 4. Elige el almacén de sesiones
/// 5. Arranca el servidor HTTP con logging, rutas, archivos estáticos y
///    redirección de la raíz
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["supremacy_hotel=debug", "sqlx=warn"] {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive {}: {}", directive, e),
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Iniciando Supremacy Hotel Server con SQLite...");

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuración inválida: {}", e);
        io_error("Configuración", e)
    })?;

    let repo = match SqliteRepo::init(&config).await {
        Ok(repo) => {
            tracing::info!(database_url = %config.database_url, "Conexión a SQLite establecida");
            repo
        }
        Err(e) => {
            tracing::error!("Error abriendo SQLite: {}", e);
            return Err(io_error("Error de SQLite", e));
        }
    };

    repo.create_schema()
        .await
        .map_err(|e| io_error("Error creando el esquema", e))?;

    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new(config.session.ttl())),
        SessionBackend::Sqlite => {
            let store = SqliteSessionStore::new(repo.clone(), config.session.ttl());
            // No es fatal: las caducadas se ignoran al leer
            if let Ok(purged) = store
                .purge_expired()
                .await
                .log_warn_context("purging expired sessions")
            {
                tracing::info!(purged, "Sesiones caducadas eliminadas");
            }
            store.spawn_purge_task(SESSION_PURGE_INTERVAL);
            Arc::new(store)
        }
    };

    let state = AppState {
        repo,
        sessions,
        settings: config.session.clone(),
    };

    tracing::info!(
        backend = ?config.session.backend,
        "Servidor iniciando en {}",
        config.bind_address
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(api::init_routes)
            .service(Files::new("/static", "./static").index_file("index.html"))
            .route("/", web::get().to(|| async {
                HttpResponse::SeeOther()
                    .append_header(("Location", api::pages::HOME))
                    .finish()
            }))
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
