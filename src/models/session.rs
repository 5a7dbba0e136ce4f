use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a user session.
///
/// The session id itself is the storage key and never lives in the record.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// The ID of the user this session belongs to.
    pub user_id: Uuid,
    /// The CSRF token mutating requests must echo back.
    pub csrf_token: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session for `user_id` that lives for `ttl`.
    pub fn new(user_id: Uuid, csrf_token: String, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            csrf_token,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Seconds left before expiry, zero once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let session = Session::new(Uuid::new_v4(), "t".into(), chrono::Duration::seconds(60));
        assert!(!session.is_expired_at(session.created_at));
        assert!(session.is_expired_at(session.expires_at));
        assert_eq!(session.remaining_secs(session.expires_at + chrono::Duration::seconds(5)), 0);
        assert_eq!(session.remaining_secs(session.created_at), 60);
    }
}
