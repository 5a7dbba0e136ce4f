use axum::{
    body::Body,
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::{
    crypto::csrf::tokens_match,
    error::{AppError, Result},
    models::identity::{CredentialSource, Identity, RejectionReason},
};

/// The header a session-authenticated client echoes its CSRF token in.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// A middleware that verifies the CSRF token on mutating requests.
///
/// Runs after [`require_auth`](super::auth::require_auth). Only callers
/// authenticated by the session cookie are checked; bearer callers carry no
/// ambient credential and pass through.
///
/// # Arguments
///
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or a `403`.
pub async fn verify_csrf(req: Request<Body>, next: Next) -> Result<Response> {
    if req.method() == Method::GET
        || req.method() == Method::HEAD
        || req.method() == Method::OPTIONS
    {
        tracing::debug!("✅ CSRF exemption: {} request", req.method());
        return Ok(next.run(req).await);
    }

    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or(RejectionReason::MissingCredentials)?;

    if let CredentialSource::Session { csrf_token, .. } = &identity.source {
        let presented = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !tokens_match(csrf_token, presented) {
            tracing::warn!("❌ CSRF token missing or mismatched for user: {}", identity.user_id);
            return Err(AppError::Forbidden("Invalid CSRF token".to_string()));
        }
    }

    Ok(next.run(req).await)
}
