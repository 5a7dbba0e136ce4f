use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::identity::RejectionReason;

/// Claims embedded in every bearer token.
///
/// The subject is the only identity claim; nothing about the credential
/// ever goes in here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// The user id.
    pub sub: Uuid,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 bearer tokens with the server-held secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    /// Creates a new `TokenIssuer`.
    ///
    /// # Arguments
    ///
    /// * `secret` - The signing secret.
    /// * `ttl` - How long an issued token stays valid.
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issues a token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        tracing::debug!("🔑 Token issued for user: {}", user_id);
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies the signature and expiry of `token` and returns its subject.
    pub fn verify(&self, token: &str) -> std::result::Result<Uuid, RejectionReason> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => RejectionReason::TokenExpired,
                _ => RejectionReason::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-signing-secret-that-is-long-enough";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, chrono::Duration::hours(24))
    }

    #[test]
    fn issued_token_verifies_to_its_subject() {
        let user_id = Uuid::new_v4();
        let issued = issuer().issue(user_id).unwrap();
        assert_eq!(issuer().verify(&issued.token), Ok(user_id));
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let issued = issuer().issue(Uuid::new_v4()).unwrap();
        let (head, signature) = issued.token.rsplit_once('.').unwrap();

        let mut flipped: Vec<char> = signature.chars().collect();
        flipped[0] = if flipped[0] == 'A' { 'B' } else { 'A' };
        let forged = format!("{}.{}", head, flipped.into_iter().collect::<String>());

        assert_eq!(issuer().verify(&forged), Err(RejectionReason::InvalidToken));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let victim = issuer().issue(Uuid::new_v4()).unwrap();
        let attacker = issuer().issue(Uuid::new_v4()).unwrap();

        let victim_parts: Vec<&str> = victim.token.split('.').collect();
        let attacker_parts: Vec<&str> = attacker.token.split('.').collect();
        let spliced = format!("{}.{}.{}", victim_parts[0], attacker_parts[1], victim_parts[2]);

        assert_eq!(issuer().verify(&spliced), Err(RejectionReason::InvalidToken));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let other = TokenIssuer::new(b"a-completely-different-secret-value!!", chrono::Duration::hours(1));
        let issued = other.issue(Uuid::new_v4()).unwrap();
        assert_eq!(issuer().verify(&issued.token), Err(RejectionReason::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = TokenIssuer::new(SECRET, chrono::Duration::seconds(-30));
        let issued = expired.issue(Uuid::new_v4()).unwrap();
        assert_eq!(issuer().verify(&issued.token), Err(RejectionReason::TokenExpired));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(issuer().verify("not.a.token"), Err(RejectionReason::InvalidToken));
        assert_eq!(issuer().verify(""), Err(RejectionReason::InvalidToken));
    }
}
