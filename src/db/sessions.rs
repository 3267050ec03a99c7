use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::SqliteRepo;
use crate::api::middleware::ErrorLogExt;
use crate::api::{AppError, AppResult};
use crate::session::{SessionData, SessionStore, SessionToken};

/// Sesiones persistidas en la tabla `sessions`, compartibles entre procesos
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    repo: SqliteRepo,
    ttl: Duration,
}

impl SqliteSessionStore {
    pub fn new(repo: SqliteRepo, ttl: Duration) -> Self {
        Self { repo, ttl }
    }

    /// Elimina las sesiones caducadas y devuelve cuántas había
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.repo.pool)
            .await
            .map_err(|e| AppError::database("purge_sessions", e))?;

        Ok(result.rows_affected())
    }

    /// Lanza una tarea que purga las sesiones caducadas cada `every`
    pub fn spawn_purge_task(&self, every: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Ok(purged) = store
                    .purge_expired()
                    .await
                    .log_warn_context("purging expired sessions")
                {
                    if purged > 0 {
                        tracing::debug!(purged, "expired sessions purged");
                    }
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, token: &SessionToken) -> AppResult<Option<SessionData>> {
        let row: Option<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT data, expires_at FROM sessions WHERE token = ?")
                .bind(token.as_str())
                .fetch_optional(&self.repo.pool)
                .await
                .log_error_context("loading session")
                .map_err(|e| AppError::database("get_session", e))?;

        match row {
            Some((_, expires_at)) if expires_at <= Utc::now() => {
                tracing::debug!(token = %token, "session expired");
                self.delete(token).await?;
                Ok(None)
            }
            Some((data, _)) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, token: &SessionToken, data: &SessionData) -> AppResult<()> {
        let payload = serde_json::to_string(data)?;
        let expires_at = Utc::now() + self.ttl;

        sqlx::query(
            r#"
            INSERT INTO sessions (token, data, expires_at) VALUES (?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET data = excluded.data, expires_at = excluded.expires_at
            "#,
        )
        .bind(token.as_str())
        .bind(payload)
        .bind(expires_at)
        .execute(&self.repo.pool)
        .await
        .log_error_context("saving session")
        .map_err(|e| AppError::database("set_session", e))?;

        Ok(())
    }

    async fn delete(&self, token: &SessionToken) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token.as_str())
            .execute(&self.repo.pool)
            .await
            .map_err(|e| AppError::database("delete_session", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StatusMessage;
    use crate::session::GuestIdentity;

    #[actix_web::test]
    async fn sqlite_store_persists_and_overwrites() {
        let repo = SqliteRepo::in_memory().await.unwrap();
        let store = SqliteSessionStore::new(repo, Duration::minutes(30));
        let token = SessionToken::generate();

        let mut data = SessionData {
            guest: Some(GuestIdentity {
                id: 1,
                full_name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone_number: "0700000000".to_string(),
            }),
            ..Default::default()
        };
        store.set(&token, &data).await.unwrap();
        assert_eq!(store.get(&token).await.unwrap(), Some(data.clone()));

        data.flash = Some(StatusMessage::success("Welcome back!"));
        store.set(&token, &data).await.unwrap();
        assert_eq!(store.get(&token).await.unwrap(), Some(data));

        store.delete(&token).await.unwrap();
        assert_eq!(store.get(&token).await.unwrap(), None);
    }

    #[actix_web::test]
    async fn expired_rows_are_absent_and_purged() {
        let repo = SqliteRepo::in_memory().await.unwrap();
        let store = SqliteSessionStore::new(repo, Duration::seconds(-1));
        let token = SessionToken::generate();

        store.set(&token, &SessionData::default()).await.unwrap();
        store.set(&SessionToken::generate(), &SessionData::default()).await.unwrap();

        assert_eq!(store.get(&token).await.unwrap(), None);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn purge_task_removes_abandoned_sessions() {
        let repo = SqliteRepo::in_memory().await.unwrap();
        let store = SqliteSessionStore::new(repo.clone(), Duration::seconds(-1));
        for _ in 0..5 {
            store.set(&SessionToken::generate(), &SessionData::default()).await.unwrap();
        }

        let task = store.spawn_purge_task(std::time::Duration::from_millis(10));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        task.abort();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
