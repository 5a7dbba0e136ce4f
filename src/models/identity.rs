use std::fmt;

use uuid::Uuid;

use crate::error::{AppError, Result};

/// The authenticated caller attached to a request by the auth gate.
///
/// This only says *who* is calling. Whether they may touch a particular
/// post or comment is decided by the controller through [`Identity::ensure_owner`].
#[derive(Debug, Clone)]
pub struct Identity {
    /// The stable id of the authenticated user.
    pub user_id: Uuid,
    /// The user's display name at the time of the request.
    pub name: String,
    /// How the caller proved their identity.
    pub source: CredentialSource,
}

impl Identity {
    /// Returns `true` when the identity owns a resource with the given owner id.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }

    /// Fails with `403` unless the identity owns the resource.
    pub fn ensure_owner(&self, owner_id: Uuid, message: &str) -> Result<()> {
        if self.owns(owner_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

/// The credential proof an [`Identity`] was resolved from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// An opaque session id carried in the signed session cookie.
    Session {
        session_id: String,
        csrf_token: String,
    },
    /// A signed bearer token from the `Authorization` header.
    Bearer,
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Session { .. } => f.write_str("Session(..)"),
            CredentialSource::Bearer => f.write_str("Bearer"),
        }
    }
}

/// Why a request or login attempt was rejected.
///
/// The distinction is kept for logs only. Clients see one of two generic
/// messages, see [`RejectionReason::public_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("no credential proof supplied")]
    MissingCredentials,
    #[error("malformed credential proof")]
    MalformedCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account not found")]
    AccountNotFound,
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
}

impl RejectionReason {
    /// The message returned to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            RejectionReason::InvalidCredentials | RejectionReason::AccountNotFound => {
                "Authentication failed"
            }
            _ => "Unauthorized",
        }
    }
}

impl From<RejectionReason> for AppError {
    fn from(reason: RejectionReason) -> Self {
        AppError::Authentication(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user_id: Uuid) -> Identity {
        Identity {
            user_id,
            name: "ada".into(),
            source: CredentialSource::Bearer,
        }
    }

    #[test]
    fn owner_passes_and_stranger_is_forbidden() {
        let owner = Uuid::new_v4();
        assert!(identity(owner).ensure_owner(owner, "nope").is_ok());

        let err = identity(Uuid::new_v4())
            .ensure_owner(owner, "nope")
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg == "nope"));
    }

    #[test]
    fn session_source_debug_hides_secrets() {
        let source = CredentialSource::Session {
            session_id: "sid-value".into(),
            csrf_token: "csrf-value".into(),
        };
        let rendered = format!("{:?}", source);
        assert!(!rendered.contains("sid-value"));
        assert!(!rendered.contains("csrf-value"));
    }
}
