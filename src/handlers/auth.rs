use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::Serialize;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use zeroize::Zeroizing;

use crate::{
    error::{AppError, Result},
    handlers::extract::{Data, JsonBody},
    middleware_layer::auth::{CSRF_COOKIE, SESSION_COOKIE},
    models::{identity::Identity, user::PublicUser},
    services::auth as auth_service,
    state::AppState,
    validation::auth::{LoginRequest, SignupRequest},
};

/// The response payload for signup.
#[derive(Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

/// The response payload for login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

/// The response payload for logout.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Creates a cookie with the given name, value, and max age.
fn create_cookie(
    name: &'static str,
    value: String,
    max_age_secs: i64,
    http_only: bool,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(http_only);
    cookie.set_secure(secure);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie.set_path("/");
    cookie
}

/// Handles user signup.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SignupRequest>,
) -> Result<Response> {
    let payload = payload.normalized().sanitized();
    tracing::info!("📝 Signup attempt - Payload: {:?}", payload);
    payload.validate()?;

    let user = auth_service::signup(&state, payload).await?;

    let response = SignupResponse {
        message: "User created successfully",
        user: PublicUser::from(&user),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Response> {
    let payload = payload.normalized();
    tracing::info!("🔐 Login attempt - Payload: {:?}", payload);
    payload.validate()?;

    let user = auth_service::authenticate(
        state.users.as_ref(),
        &payload.email,
        Zeroizing::new(payload.password),
    )
    .await?;

    let outcome = auth_service::issue_login(&state, user).await?;

    let mut csrf_token = None;
    if let Some(session) = outcome.session {
        let max_age = state.config.session_ttl_secs;
        let secure = state.config.cookie_secure;

        cookies.signed(&state.cookie_key).add(create_cookie(
            SESSION_COOKIE,
            session.session_id,
            max_age,
            true,
            secure,
        ));
        cookies.add(create_cookie(
            CSRF_COOKIE,
            session.csrf_token.clone(),
            max_age,
            false,
            secure,
        ));
        tracing::info!("✅ Session cookie added, expires at {}", session.expires_at);

        csrf_token = Some(session.csrf_token);
    }

    let response = LoginResponse {
        message: "Successful login",
        user: PublicUser::from(&outcome.user),
        token_expires_at: outcome.token.as_ref().map(|t| t.expires_at),
        token: outcome.token.map(|t| t.token),
        csrf_token,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    cookies: Cookies,
) -> Result<Response> {
    tracing::info!("👋 Logout for user: {}", identity.user_id);

    auth_service::logout(&state, &identity).await?;

    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    let mut csrf_cookie = Cookie::new(CSRF_COOKIE, "");
    csrf_cookie.set_path("/");
    cookies.remove(csrf_cookie);

    tracing::info!("✅ User logged out: {}", identity.user_id);

    let response = MessageResponse {
        message: "Logout successful",
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the authenticated caller.
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Data<PublicUser>>> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(Data {
        data: PublicUser::from(&user),
    }))
}
