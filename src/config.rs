use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// Minimum length, in bytes, accepted for the signing secrets.
const MIN_SECRET_LEN: usize = 32;

/// How a successful login proves itself on later requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Opaque session id in a signed, HTTP-only cookie.
    Session,
    /// Signed bearer token returned in the login body.
    Token,
    /// Both of the above, issued together.
    Both,
}

impl AuthMode {
    pub fn sessions_enabled(self) -> bool {
        matches!(self, AuthMode::Session | AuthMode::Both)
    }

    pub fn tokens_enabled(self) -> bool {
        matches!(self, AuthMode::Token | AuthMode::Both)
    }
}

impl std::str::FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(AuthMode::Session),
            "token" | "bearer" => Ok(AuthMode::Token),
            "both" => Ok(AuthMode::Both),
            other => anyhow::bail!("AUTH_MODE must be session, token or both (got {other:?})"),
        }
    }
}

/// Where users, posts and comments are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres(String),
    /// In-process store, selected with `DATABASE_URL=memory://`.
    Memory,
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// Where the records live.
    pub storage: StorageBackend,
    /// The URL of the Redis server. `None` keeps sessions in process.
    pub redis_url: Option<String>,
    /// Secret used to sign bearer tokens.
    pub jwt_secret: Zeroizing<String>,
    /// Secret used to sign the session cookie.
    pub session_secret: Zeroizing<String>,
    pub auth_mode: AuthMode,
    /// Lifetime of a server-side session in seconds.
    pub session_ttl_secs: i64,
    /// Lifetime of a bearer token in seconds.
    pub token_ttl_secs: i64,
    pub bind_addr: SocketAddr,
    /// Directory uploaded images are written to and served from.
    pub upload_dir: PathBuf,
    pub cors_origins: Vec<String>,
    /// Whether cookies carry the `Secure` flag.
    pub cookie_secure: bool,
    /// Global requests per minute per client IP.
    pub rate_limit_per_minute: u32,
    /// Signup/login requests per minute per client IP.
    pub auth_rate_limit_per_minute: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = match &self.storage {
            StorageBackend::Postgres(_) => "postgres",
            StorageBackend::Memory => "memory",
        };
        f.debug_struct("Config")
            .field("storage", &storage)
            .field("redis", &self.redis_url.is_some())
            .field("jwt_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("auth_mode", &self.auth_mode)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bind_addr", &self.bind_addr)
            .field("upload_dir", &self.upload_dir)
            .field("cors_origins", &self.cors_origins)
            .field("cookie_secure", &self.cookie_secure)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("auth_rate_limit_per_minute", &self.auth_rate_limit_per_minute)
            .finish()
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a `Config` from any key lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let storage = if database_url.starts_with("memory://") {
            StorageBackend::Memory
        } else {
            StorageBackend::Postgres(database_url)
        };

        let jwt_secret = Zeroizing::new(
            get("JWT_SECRET")
                .context("JWT_SECRET must be set (generate with: openssl rand -hex 32)")?,
        );
        if jwt_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} bytes");
        }

        let session_secret = Zeroizing::new(
            get("SESSION_SECRET")
                .context("SESSION_SECRET must be set (generate with: openssl rand -hex 32)")?,
        );
        if session_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes");
        }

        let auth_mode = get("AUTH_MODE")
            .map(|v| v.parse::<AuthMode>())
            .transpose()?
            .unwrap_or(AuthMode::Session);

        let session_ttl_secs: i64 = parse_or(&get, "SESSION_TTL_SECS", 86_400)?;
        let token_ttl_secs: i64 = parse_or(&get, "TOKEN_TTL_SECS", 86_400)?;
        if session_ttl_secs <= 0 || token_ttl_secs <= 0 {
            anyhow::bail!("SESSION_TTL_SECS and TOKEN_TTL_SECS must be positive");
        }

        let ip: IpAddr = get("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;
        let port: u16 = parse_or(&get, "PORT", 4000)?;

        let is_production = get("APP_ENV").as_deref() == Some("production");
        let cookie_secure = match get("COOKIE_SECURE") {
            Some(v) => v.parse().context("Invalid COOKIE_SECURE")?,
            None => true,
        } || is_production;

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let rate_limit_per_minute: u32 = parse_or(&get, "RATE_LIMIT_PER_MINUTE", 20)?;
        let auth_rate_limit_per_minute: u32 = parse_or(&get, "AUTH_RATE_LIMIT_PER_MINUTE", 5)?;
        if rate_limit_per_minute == 0 || auth_rate_limit_per_minute == 0 {
            anyhow::bail!("Rate limits must be at least 1 request per minute");
        }

        Ok(Self {
            storage,
            redis_url: get("REDIS_URL"),
            jwt_secret,
            session_secret,
            auth_mode,
            session_ttl_secs,
            token_ttl_secs,
            bind_addr: SocketAddr::new(ip, port),
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            cors_origins,
            cookie_secure,
            rate_limit_per_minute,
            auth_rate_limit_per_minute,
        })
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_secs)
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("Invalid {key}")),
        None => Ok(default),
    }
}
