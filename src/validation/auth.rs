use std::fmt;

use garde::Validate;
use serde::Deserialize;

use crate::validation::sanitize::escape_html;

/// The request payload for user signup.
#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[garde(length(chars, min = 3, max = 200))]
    pub name: String,
    #[serde(default)]
    #[garde(email)]
    pub email: String,
    /// Upper bound keeps a single request from buying unbounded hashing work.
    #[serde(default)]
    #[garde(length(chars, min = 8, max = 128))]
    pub password: String,
}

impl SignupRequest {
    /// Trims the name and email. The password is taken exactly as sent.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }

    /// Escapes the display name. Length rules apply to the escaped form.
    pub fn sanitized(self) -> Self {
        Self {
            name: escape_html(&self.name),
            ..self
        }
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// The request payload for user login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[garde(length(min = 1, max = 320))]
    pub email: String,
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 128))]
    pub password: String,
}

impl LoginRequest {
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
