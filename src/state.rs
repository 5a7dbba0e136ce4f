use std::sync::Arc;

use redis::aio::ConnectionManager;
use sha2::{Digest, Sha512};
use tower_cookies::Key;

use crate::config::{Config, StorageBackend};
use crate::crypto::token::TokenIssuer;
use crate::error::Result;
use crate::middleware_layer::auth::AuthGate;
use crate::repositories::{
    comment::PgCommentRepository, memory::MemoryStore, post::PgPostRepository,
    user::PgUserRepository, CommentRepository, PostRepository, UserRepository,
};
use crate::services::images::ImageStore;
use crate::session_store::{MemorySessionStore, RedisSessionStore, SessionStore};

/// The three record repositories, chosen together.
struct Repositories {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            posts: Arc::new(store.clone()),
            comments: Arc::new(store),
        }
    }
}

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// The credential store.
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    /// Server-side session records.
    pub sessions: Arc<dyn SessionStore>,
    /// Bearer token signer and verifier.
    pub tokens: TokenIssuer,
    /// Key the session cookie is signed with.
    pub cookie_key: Key,
    /// Uploaded cover images and profile photos.
    pub images: ImageStore,
    /// The per-request authorization gate.
    pub gate: AuthGate,
}

impl AppState {
    /// Creates a new `AppState`, connecting to whatever backends `config`
    /// names.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: Config) -> Result<Self> {
        let repositories = match &config.storage {
            StorageBackend::Postgres(database_url) => {
                let db = crate::db::create_pool(database_url)?;
                crate::db::migrate(&db).await?;
                tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");

                Repositories {
                    users: Arc::new(PgUserRepository::new(db.clone())),
                    posts: Arc::new(PgPostRepository::new(db.clone())),
                    comments: Arc::new(PgCommentRepository::new(db)),
                }
            }
            StorageBackend::Memory => {
                tracing::warn!("⚠️ Using the in-memory store, data will not survive a restart");
                Repositories::in_memory()
            }
        };

        let sessions: Arc<dyn SessionStore> = match &config.redis_url {
            Some(redis_url) => {
                let redis_client = redis::Client::open(redis_url.as_str())?;
                let redis = ConnectionManager::new(redis_client).await?;
                tracing::info!("✅ Redis Connection Manager initialized (pooled)");
                Arc::new(RedisSessionStore::new(redis))
            }
            None => {
                tracing::warn!("⚠️ REDIS_URL not set, sessions are kept in process");
                Arc::new(MemorySessionStore::new())
            }
        };

        Ok(Self::assemble(config, repositories, sessions))
    }

    /// State backed entirely by in-process stores.
    pub fn in_memory(config: Config) -> Self {
        Self::assemble(config, Repositories::in_memory(), Arc::new(MemorySessionStore::new()))
    }

    fn assemble(config: Config, repositories: Repositories, sessions: Arc<dyn SessionStore>) -> Self {
        let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl());
        let cookie_key = Key::from(Sha512::digest(config.session_secret.as_bytes()).as_slice());
        let images = ImageStore::new(config.upload_dir.clone());

        let gate = AuthGate::new(
            config.auth_mode,
            repositories.users.clone(),
            sessions.clone(),
            tokens.clone(),
            cookie_key.clone(),
        );
        tracing::info!("✅ Auth gate initialized ({:?})", gate.strategies());

        AppState {
            config: Arc::new(config),
            users: repositories.users,
            posts: repositories.posts,
            comments: repositories.comments,
            sessions,
            tokens,
            cookie_key,
            images,
            gate,
        }
    }
}
