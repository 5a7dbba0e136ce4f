use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tower_cookies::{
    cookie::{Cookie, CookieJar},
    Key,
};
use uuid::Uuid;

use crate::{
    config::AuthMode,
    crypto::token::TokenIssuer,
    error::{AppError, Result},
    models::identity::{CredentialSource, Identity, RejectionReason},
    repositories::UserRepository,
    session_store::{SessionLookup, SessionStore},
    state::AppState,
};

/// Name of the signed cookie carrying the opaque session id.
pub const SESSION_COOKIE: &str = "session_id";
/// Name of the readable cookie mirroring the session's CSRF token.
pub const CSRF_COOKIE: &str = "csrf_token";

/// One way of proving who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Server-side session referenced by the signed session cookie.
    Local,
    /// Signed token in `Authorization: Bearer <token>`.
    Bearer,
}

impl AuthStrategy {
    /// Resolves this strategy's proof to an identity.
    ///
    /// Returns [`RejectionReason::MissingCredentials`] when the request does
    /// not carry this strategy's proof at all, so the gate can try the next
    /// one. Any other rejection is final.
    pub async fn authenticate(self, gate: &AuthGate, headers: &HeaderMap) -> Result<Identity> {
        match self {
            AuthStrategy::Bearer => {
                let token = bearer_token(headers)?;
                let user_id = gate.tokens.verify(token)?;
                gate.resolve_user(user_id, CredentialSource::Bearer).await
            }
            AuthStrategy::Local => {
                let session_id = signed_session_id(headers, &gate.cookie_key)?;
                match gate.sessions.get(&session_id).await? {
                    SessionLookup::Active(session) => {
                        let source = CredentialSource::Session {
                            session_id,
                            csrf_token: session.csrf_token,
                        };
                        gate.resolve_user(session.user_id, source).await
                    }
                    SessionLookup::Expired => Err(RejectionReason::SessionExpired.into()),
                    SessionLookup::NotFound => Err(RejectionReason::SessionNotFound.into()),
                }
            }
        }
    }
}

/// Maps a request's credential proof to an [`Identity`], or rejects it.
///
/// The gate answers *who* is calling. Whether that caller may change a given
/// resource is the controller's call, via [`Identity::ensure_owner`].
#[derive(Clone)]
pub struct AuthGate {
    strategies: Vec<AuthStrategy>,
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
    tokens: TokenIssuer,
    cookie_key: Key,
}

impl AuthGate {
    /// Creates a gate trying the strategies `mode` enables. With both
    /// enabled a bearer header wins over the cookie.
    pub fn new(
        mode: AuthMode,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionStore>,
        tokens: TokenIssuer,
        cookie_key: Key,
    ) -> Self {
        let mut strategies = Vec::with_capacity(2);
        if mode.tokens_enabled() {
            strategies.push(AuthStrategy::Bearer);
        }
        if mode.sessions_enabled() {
            strategies.push(AuthStrategy::Local);
        }

        Self {
            strategies,
            users,
            sessions,
            tokens,
            cookie_key,
        }
    }

    pub fn strategies(&self) -> &[AuthStrategy] {
        &self.strategies
    }

    /// Authenticates a request from its headers.
    ///
    /// Rejections come back as [`AppError::Authentication`];
    /// a failing session or credential store surfaces as its own error.
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<Identity> {
        for strategy in &self.strategies {
            match strategy.authenticate(self, headers).await {
                Err(AppError::Authentication(RejectionReason::MissingCredentials)) => continue,
                outcome => return outcome,
            }
        }

        Err(RejectionReason::MissingCredentials.into())
    }

    async fn resolve_user(&self, user_id: Uuid, source: CredentialSource) -> Result<Identity> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(RejectionReason::AccountNotFound)?;

        Ok(Identity {
            user_id: user.id,
            name: user.name,
            source,
        })
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> std::result::Result<&str, RejectionReason> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(RejectionReason::MissingCredentials);
    };

    let value = value
        .to_str()
        .map_err(|_| RejectionReason::MalformedCredentials)?;
    let (scheme, token) = value
        .split_once(' ')
        .ok_or(RejectionReason::MalformedCredentials)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(RejectionReason::MalformedCredentials);
    }

    Ok(token)
}

/// Reads the session id out of the signed session cookie.
///
/// A cookie whose signature does not verify is malformed, not missing.
fn signed_session_id(headers: &HeaderMap, key: &Key) -> std::result::Result<String, RejectionReason> {
    let mut jar = CookieJar::new();
    headers
        .get_all(header::COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| Cookie::parse_encoded(pair.trim().to_owned()).ok())
        .for_each(|cookie| jar.add_original(cookie));

    if jar.get(SESSION_COOKIE).is_none() {
        return Err(RejectionReason::MissingCredentials);
    }

    jar.signed(key)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(RejectionReason::MalformedCredentials)
}

/// A middleware that requires an authenticated caller.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// The downstream `Response` with the [`Identity`] attached to the request,
/// or a `401`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    tracing::debug!("🔐 Checking authentication...");

    let identity = state.gate.authorize(request.headers()).await?;
    tracing::debug!("✅ User authenticated: {} via {:?}", identity.user_id, identity.source);

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
