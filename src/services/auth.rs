use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::crypto::csrf::{generate_csrf_token, generate_session_id};
use crate::crypto::password::{hash_in_background, verify_in_background};
use crate::crypto::token::IssuedToken;
use crate::error::{AppError, Result};
use crate::models::identity::{CredentialSource, Identity, RejectionReason};
use crate::models::session::Session;
use crate::models::user::{NewUser, User};
use crate::repositories::UserRepository;
use crate::state::AppState;
use crate::validation::auth::SignupRequest;

/// A freshly persisted server-side session.
pub struct IssuedSession {
    pub session_id: String,
    pub csrf_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Everything a successful login hands back to the client.
pub struct LoginOutcome {
    pub user: User,
    pub token: Option<IssuedToken>,
    pub session: Option<IssuedSession>,
}

/// Creates a new user.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - A validated, sanitized signup request.
///
/// # Returns
///
/// A `Result` containing the created `User`.
pub async fn signup(state: &AppState, request: SignupRequest) -> Result<User> {
    tracing::debug!("🔐 Creating user: {}", request.name);

    if state.users.find_by_email(&request.email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_in_background(Zeroizing::new(request.password)).await?;

    let user = state
        .users
        .create(NewUser {
            name: request.name,
            email: request.email,
            password_hash,
        })
        .await?;

    tracing::info!("✅ User created with ID: {}", user.id);
    Ok(user)
}

/// Checks an email and password against the credential store.
///
/// An unknown email still runs one bcrypt verification so both failure
/// paths take the same time. The two rejections differ only in the log.
///
/// # Arguments
///
/// * `users` - The credential store.
/// * `email` - The submitted email.
/// * `password` - The submitted password.
///
/// # Returns
///
/// A `Result` containing the authenticated `User`.
pub async fn authenticate(
    users: &dyn UserRepository,
    email: &str,
    password: Zeroizing<String>,
) -> Result<User> {
    let user = users.find_by_email(email).await?;
    let matched = verify_in_background(
        password,
        user.as_ref().map(|u| u.password_hash.clone()),
    )
    .await?;

    match user {
        None => Err(RejectionReason::AccountNotFound.into()),
        Some(user) if matched => {
            tracing::info!("✅ User authenticated: {}", user.id);
            Ok(user)
        }
        Some(user) => {
            tracing::debug!("Password mismatch for user: {}", user.id);
            Err(RejectionReason::InvalidCredentials.into())
        }
    }
}

/// Issues whatever credentials the configured mode calls for.
///
/// The token is signed before the session is written, and a token is only
/// handed out once the session write has succeeded, so a failure leaves
/// nothing usable behind.
pub async fn issue_login(state: &AppState, user: User) -> Result<LoginOutcome> {
    let mode = state.config.auth_mode;

    let token = if mode.tokens_enabled() {
        Some(state.tokens.issue(user.id)?)
    } else {
        None
    };

    let session = if mode.sessions_enabled() {
        let session_id = generate_session_id();
        let csrf_token = generate_csrf_token();
        let record = Session::new(user.id, csrf_token.clone(), state.config.session_ttl());

        state.sessions.put(&session_id, &record).await?;
        tracing::info!("✅ Session created for user: {}", user.id);

        Some(IssuedSession {
            session_id,
            csrf_token,
            expires_at: record.expires_at,
        })
    } else {
        None
    };

    Ok(LoginOutcome { user, token, session })
}

/// Ends the caller's session. Bearer tokens are stateless and simply lapse.
pub async fn logout(state: &AppState, identity: &Identity) -> Result<()> {
    if let CredentialSource::Session { session_id, .. } = &identity.source {
        state.sessions.delete(session_id).await?;
        tracing::info!("✅ Session deleted for user: {}", identity.user_id);
    }
    Ok(())
}
