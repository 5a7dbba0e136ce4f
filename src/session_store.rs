use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, Result},
    models::session::Session,
};

/// The outcome of looking a session id up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Active(Session),
    Expired,
    NotFound,
}

/// Server-side storage for session records keyed by opaque session id.
///
/// Records are only ever written, read or removed whole, so a single-key
/// get/set is all the atomicity the store has to provide.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `session` under `session_id` until its `expires_at`.
    async fn put(&self, session_id: &str, session: &Session) -> Result<()>;

    /// Resolves `session_id`. An expired record is removed as it is seen.
    async fn get(&self, session_id: &str) -> Result<SessionLookup>;

    /// Removes `session_id`. Removing an unknown id is not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;
}

fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

/// A session store backed by Redis with per-key expiry.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, session_id: &str, session: &Session) -> Result<()> {
        let ttl = session.remaining_secs(Utc::now());
        if ttl == 0 {
            return Err(AppError::Internal("Refusing to store an expired session".to_string()));
        }

        let session_json = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

        let mut redis = self.redis.clone();
        let _: () = redis
            .set_ex(session_key(session_id), &session_json, ttl)
            .await
            .map_err(|e| {
                tracing::error!("❌ Redis set_ex failed: {}", e);
                AppError::Redis(e)
            })?;

        tracing::debug!("✅ Session saved to Redis for user: {}", session.user_id);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<SessionLookup> {
        let mut redis = self.redis.clone();
        let session_json: Option<String> = redis.get(session_key(session_id)).await?;

        let Some(session_json) = session_json else {
            return Ok(SessionLookup::NotFound);
        };

        let session: Session = match sonic_rs::from_str(&session_json) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("❌ Invalid session JSON, discarding: {}", e);
                let _: () = redis.del(session_key(session_id)).await.unwrap_or(());
                return Ok(SessionLookup::NotFound);
            }
        };

        if session.is_expired_at(Utc::now()) {
            tracing::debug!("Session expired for user: {}", session.user_id);
            let _: () = redis.del(session_key(session_id)).await.unwrap_or(());
            return Ok(SessionLookup::Expired);
        }

        Ok(SessionLookup::Active(session))
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: () = redis.del(session_key(session_id)).await?;
        Ok(())
    }
}

/// A process-local session store for single-instance deployments and tests.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired ones not yet swept included.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session_id: &str, session: &Session) -> Result<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        // Sweep on write so abandoned sessions cannot pile up.
        sessions.retain(|_, stored| !stored.is_expired_at(now));
        sessions.insert(session_id.to_string(), session.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<SessionLookup> {
        let mut sessions = self.sessions.lock().await;

        match sessions.get(session_id) {
            None => Ok(SessionLookup::NotFound),
            Some(session) if session.is_expired_at(Utc::now()) => {
                sessions.remove(session_id);
                Ok(SessionLookup::Expired)
            }
            Some(session) => Ok(SessionLookup::Active(session.clone())),
        }
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.lock().await.remove(session_id);
        Ok(())
    }
}
