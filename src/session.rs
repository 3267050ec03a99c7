//! # Estado de sesión
//!
//! Los datos de sesión viven fuera del handler, detrás de [`SessionStore`],
//! indexados por un token opaco que viaja en una cookie. Cada petición carga
//! su [`SessionData`], la modifica y la vuelve a guardar.
//!
//! Una reserva pendiente solo existe aquí: si la sesión caduca antes de que el
//! visitante se autentique, la reserva se pierde.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::api::{AppError, AppResult, StatusMessage};
use crate::db::models::{AdminId, GuestId};

/// Token opaco de sesión
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Acepta solo tokens con forma de UUID; cualquier otra cookie se ignora
    pub fn parse(raw: &str) -> Option<Self> {
        uuid::Uuid::parse_str(raw).ok().map(|u| Self(u.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: AdminId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestIdentity {
    pub id: GuestId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
}

/// Reserva enviada sin sesión de huésped, a la espera de registro o login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBooking {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub guests: i64,
    pub room_type: String,
    pub nights: i64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub admin: Option<AdminIdentity>,
    #[serde(default)]
    pub guest: Option<GuestIdentity>,
    #[serde(default)]
    pub pending_booking: Option<PendingBooking>,
    #[serde(default)]
    pub flash: Option<StatusMessage>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self == &SessionData::default()
    }

    pub fn take_flash(&mut self) -> Option<StatusMessage> {
        self.flash.take()
    }
}

/// Almacén de sesiones por token
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Devuelve los datos si la sesión existe y no ha caducado
    async fn get(&self, token: &SessionToken) -> AppResult<Option<SessionData>>;

    /// Guarda los datos y renueva la caducidad
    async fn set(&self, token: &SessionToken, data: &SessionData) -> AppResult<()>;

    async fn delete(&self, token: &SessionToken) -> AppResult<()>;
}

/// Sesiones en memoria del proceso con caducidad deslizante
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionToken, (SessionData, DateTime<Utc>)>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Número de sesiones guardadas, caducadas incluidas
    pub fn len(&self) -> AppResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(
        &self,
    ) -> AppResult<std::sync::MutexGuard<'_, HashMap<SessionToken, (SessionData, DateTime<Utc>)>>> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Session("session mutex poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, token: &SessionToken) -> AppResult<Option<SessionData>> {
        let mut sessions = self.lock()?;

        match sessions.get(token) {
            Some((_, expires_at)) if *expires_at <= Utc::now() => {
                tracing::debug!(token = %token, "session expired");
                sessions.remove(token);
                Ok(None)
            }
            Some((data, _)) => Ok(Some(data.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, token: &SessionToken, data: &SessionData) -> AppResult<()> {
        let now = Utc::now();
        let mut sessions = self.lock()?;

        // Las sesiones abandonadas no se vuelven a leer nunca
        let before = sessions.len();
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "expired sessions evicted");
        }

        sessions.insert(token.clone(), (data.clone(), now + self.ttl));
        Ok(())
    }

    async fn delete(&self, token: &SessionToken) -> AppResult<()> {
        self.lock()?.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_ok, assert_err};

    fn pending() -> PendingBooking {
        PendingBooking {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            phone: "0700000000".to_string(),
            checkin: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            checkout: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            guests: 2,
            room_type: "Standard Room".to_string(),
            nights: 3,
            total_amount: 46500.0,
        }
    }

    #[test]
    fn pending_booking_uses_form_field_names() {
        let json = serde_json::to_value(pending()).unwrap();
        assert_eq!(json["roomType"], "Standard Room");
        assert_eq!(json["totalAmount"], 46500.0);
        assert_eq!(json["checkin"], "2024-03-01");
    }

    #[test]
    fn session_data_tolerates_missing_fields() {
        let data: SessionData = serde_json::from_str("{}").unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn token_parse_rejects_garbage() {
        assert!(SessionToken::parse("not-a-token").is_none());
        let token = SessionToken::generate();
        assert_eq!(SessionToken::parse(token.as_str()), Some(token));
    }

    #[actix_web::test]
    async fn memory_store_round_trip_and_delete() {
        let store = MemorySessionStore::new(Duration::minutes(5));
        let token = SessionToken::generate();
        let data = SessionData {
            pending_booking: Some(pending()),
            ..Default::default()
        };

        assert_ok!(store.set(&token, &data).await);
        assert_eq!(store.get(&token).await.unwrap(), Some(data));

        assert_ok!(store.delete(&token).await);
        assert_eq!(store.get(&token).await.unwrap(), None);
    }

    #[actix_web::test]
    async fn expired_session_loses_pending_booking() {
        let store = MemorySessionStore::new(Duration::zero());
        let token = SessionToken::generate();
        let data = SessionData {
            pending_booking: Some(pending()),
            ..Default::default()
        };

        store.set(&token, &data).await.unwrap();
        assert_eq!(store.get(&token).await.unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[actix_web::test]
    async fn abandoned_sessions_are_evicted_on_write() {
        let store = MemorySessionStore::new(Duration::zero());
        for _ in 0..1000 {
            store.set(&SessionToken::generate(), &SessionData::default()).await.unwrap();
        }

        let token = SessionToken::generate();
        store.set(&token, &SessionData::default()).await.unwrap();
        assert_eq!(store.len().unwrap(), 1);

        assert_eq!(store.get(&token).await.unwrap(), None);
        assert_eq!(store.len().unwrap(), 0);
    }

    #[actix_web::test]
    async fn live_sessions_survive_eviction() {
        let store = MemorySessionStore::new(Duration::minutes(5));
        let first = SessionToken::generate();
        store.set(&first, &SessionData::default()).await.unwrap();
        store.set(&SessionToken::generate(), &SessionData::default()).await.unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert!(store.get(&first).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn poisoned_lock_surfaces_session_error() {
        let store = MemorySessionStore::new(Duration::minutes(5));
        let inner = Arc::clone(&store.sessions);
        let _ = std::thread::spawn(move || {
            let _guard = inner.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert_err!(store.get(&SessionToken::generate()).await);
    }
}
